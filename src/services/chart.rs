//! Historical portfolio value series.
//!
//! Dated value deltas are merged per day, accumulated, and forward-filled
//! over calendar gaps: a day with no event carries the last known value
//! instead of interpolating or dropping to zero, so the series only moves on
//! real events.

use bigdecimal::{BigDecimal, ToPrimitive};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

pub const PAST_YEAR_DAYS: usize = 365;
pub const PAST_THREE_YEARS_DAYS: usize = 1095;

/// One dated change in portfolio value: positive on acquisition and
/// mark-to-market, negative on sale.
#[derive(Debug, Clone)]
pub struct ValueEvent {
    pub date: NaiveDate,
    pub company_id: Uuid,
    pub delta: BigDecimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompanyDelta {
    pub company_id: Uuid,
    pub delta: BigDecimal,
}

/// Cumulative portfolio value on one day. `breakdown` lists the deltas that
/// landed on this day; filled gap days carry an empty breakdown.
#[derive(Debug, Clone, Serialize)]
pub struct ChartPoint {
    pub date: NaiveDate,
    pub value: BigDecimal,
    pub breakdown: Vec<CompanyDelta>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartWindow {
    pub points: Vec<ChartPoint>,
    pub return_percent: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PortfolioChart {
    pub all_time: ChartWindow,
    pub past_year: ChartWindow,
    pub past_three_years: ChartWindow,
}

pub fn build_chart(events: Vec<ValueEvent>, as_of: NaiveDate) -> PortfolioChart {
    let filled = fill_daily(cumulative_points(merge_by_date(events)), as_of);

    let past_year = window(tail(&filled, PAST_YEAR_DAYS));
    let past_three_years = window(tail(&filled, PAST_THREE_YEARS_DAYS));
    let all_time = window(filled);

    PortfolioChart {
        all_time,
        past_year,
        past_three_years,
    }
}

fn merge_by_date(events: Vec<ValueEvent>) -> BTreeMap<NaiveDate, Vec<CompanyDelta>> {
    let mut merged: BTreeMap<NaiveDate, Vec<CompanyDelta>> = BTreeMap::new();
    for event in events {
        merged.entry(event.date).or_default().push(CompanyDelta {
            company_id: event.company_id,
            delta: event.delta,
        });
    }
    merged
}

fn cumulative_points(merged: BTreeMap<NaiveDate, Vec<CompanyDelta>>) -> Vec<ChartPoint> {
    let mut running = BigDecimal::from(0);
    let mut points = Vec::with_capacity(merged.len());
    for (date, breakdown) in merged {
        for delta in &breakdown {
            running = running + &delta.delta;
        }
        points.push(ChartPoint {
            date,
            value: running.clone(),
            breakdown,
        });
    }
    points
}

/// Expand to one point per calendar day from the earliest event through
/// `as_of`, carrying the last known value forward over gaps.
fn fill_daily(points: Vec<ChartPoint>, as_of: NaiveDate) -> Vec<ChartPoint> {
    let first_date = match points.first() {
        Some(point) => point.date,
        None => return Vec::new(),
    };
    let last_date = match points.last() {
        Some(point) => point.date,
        None => return Vec::new(),
    };
    let end = as_of.max(last_date);

    let mut filled = Vec::new();
    let mut last_value = BigDecimal::from(0);
    let mut idx = 0;
    let mut day = first_date;
    loop {
        if idx < points.len() && points[idx].date == day {
            last_value = points[idx].value.clone();
            filled.push(points[idx].clone());
            idx += 1;
        } else {
            filled.push(ChartPoint {
                date: day,
                value: last_value.clone(),
                breakdown: Vec::new(),
            });
        }

        if day >= end {
            break;
        }
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }
    filled
}

fn tail(points: &[ChartPoint], days: usize) -> Vec<ChartPoint> {
    if points.len() > days {
        points[points.len() - days..].to_vec()
    } else {
        points.to_vec()
    }
}

/// A window starting from a zero value reports `0.0`: there is no meaningful
/// rate of return on nothing.
fn window(points: Vec<ChartPoint>) -> ChartWindow {
    let zero = BigDecimal::from(0);
    let return_percent = match (points.first(), points.last()) {
        (Some(first), Some(last)) if first.value != zero => {
            ((&last.value - &first.value) * BigDecimal::from(100) / &first.value)
                .to_f64()
                .unwrap_or(0.0)
        }
        _ => 0.0,
    };

    ChartWindow {
        points,
        return_percent,
    }
}
