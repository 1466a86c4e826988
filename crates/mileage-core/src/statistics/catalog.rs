//! Built-in vehicle statistics
//!
//! Every compute function is a pure function of the vehicle snapshot and its
//! fill-ups. Records are sorted by odometer before use, so callers may pass
//! them in any order.
//!
//! Fuel economy is measured over full-tank intervals: a full fill-up closes
//! the interval opened by the previous full fill-up, and the interval's fuel
//! is everything pumped after the opening fill-up, partial fills included.

use super::registry::{DetailView, StatisticDefinition};
use crate::models::{Fillup, StatGroup, Vehicle};

const DAYS_PER_MONTH: f64 = 30.4375;

/// Fill-ups ordered by odometer, date breaking ties
fn by_odometer(fillups: &[Fillup]) -> Vec<&Fillup> {
    let mut sorted: Vec<_> = fillups.iter().collect();
    sorted.sort_by(|a, b| {
        a.odometer
            .total_cmp(&b.odometer)
            .then_with(|| a.date.cmp(&b.date))
    });
    sorted
}

/// (distance, volume) of each full-tank interval, in odometer order
fn economy_intervals(fillups: &[Fillup]) -> Vec<(f64, f64)> {
    let mut intervals = Vec::new();
    let mut opened_at: Option<f64> = None;
    let mut volume = 0.0;

    for fillup in by_odometer(fillups) {
        let Some(start) = opened_at else {
            if !fillup.partial {
                opened_at = Some(fillup.odometer);
            }
            continue;
        };

        volume += fillup.volume;
        if !fillup.partial {
            let distance = fillup.odometer - start;
            if distance > 0.0 && volume > 0.0 {
                intervals.push((distance, volume));
            }
            opened_at = Some(fillup.odometer);
            volume = 0.0;
        }
    }

    intervals
}

/// Distance per volume for each interval
fn economy_ratios(fillups: &[Fillup]) -> Vec<f64> {
    economy_intervals(fillups)
        .into_iter()
        .map(|(distance, volume)| distance / volume)
        .collect()
}

fn average_ratio(fillups: &[Fillup]) -> Option<f64> {
    let intervals = economy_intervals(fillups);
    if intervals.is_empty() {
        return None;
    }
    let (distance, volume) = intervals
        .iter()
        .fold((0.0, 0.0), |(d, v), (di, vi)| (d + di, v + vi));
    Some(distance / volume)
}

fn total_distance(fillups: &[Fillup]) -> Option<f64> {
    let sorted = by_odometer(fillups);
    let (first, last) = (sorted.first()?, sorted.last()?);
    let distance = last.odometer - first.odometer;
    (distance > 0.0).then_some(distance)
}

/// Mean odometer delta between consecutive fill-ups
fn average_distance(fillups: &[Fillup]) -> Option<f64> {
    if fillups.len() < 2 {
        return None;
    }
    total_distance(fillups).map(|d| d / (fillups.len() - 1) as f64)
}

/// Days between the earliest and latest fill-up
fn span_days(fillups: &[Fillup]) -> Option<f64> {
    let first = fillups.iter().map(|f| f.date).min()?;
    let last = fillups.iter().map(|f| f.date).max()?;
    let days = (last - first).num_days();
    (days > 0).then_some(days as f64)
}

fn ensure_sane(fillups: &[Fillup]) -> anyhow::Result<()> {
    for fillup in fillups {
        anyhow::ensure!(
            fillup.volume >= 0.0 && fillup.unit_price >= 0.0,
            "fill-up on {} has a negative volume or price",
            fillup.date
        );
    }
    Ok(())
}

fn total_volume(fillups: &[Fillup]) -> anyhow::Result<Option<f64>> {
    ensure_sane(fillups)?;
    if fillups.is_empty() {
        return Ok(None);
    }
    Ok(Some(fillups.iter().map(|f| f.volume).sum()))
}

fn total_cost(fillups: &[Fillup]) -> anyhow::Result<Option<f64>> {
    ensure_sane(fillups)?;
    if fillups.is_empty() {
        return Ok(None);
    }
    Ok(Some(fillups.iter().map(Fillup::total_cost).sum()))
}

/// Cost of the fuel burned over the tracked distance
///
/// The first fill-up's fuel was burned before tracking started, so it is left out.
fn cost_per_distance(fillups: &[Fillup]) -> anyhow::Result<Option<f64>> {
    ensure_sane(fillups)?;
    let Some(distance) = total_distance(fillups) else {
        return Ok(None);
    };
    let burned: f64 = by_odometer(fillups)
        .iter()
        .skip(1)
        .map(|f| f.total_cost())
        .sum();
    Ok(Some(burned / distance))
}

fn prices(fillups: &[Fillup]) -> anyhow::Result<Vec<f64>> {
    ensure_sane(fillups)?;
    Ok(fillups.iter().map(|f| f.unit_price).collect())
}

fn economy_value(vehicle: &Vehicle, value: f64) -> String {
    format!("{:.2} {}", value, vehicle.economy_abbreviation())
}

fn distance_value(vehicle: &Vehicle, value: f64) -> String {
    format!("{:.1} {}", value, vehicle.distance_unit.abbreviation())
}

fn volume_value(vehicle: &Vehicle, value: f64) -> String {
    format!("{:.2} {}", value, vehicle.volume_unit.abbreviation())
}

fn money_value(vehicle: &Vehicle, value: f64) -> String {
    format!("{}{:.2}", vehicle.currency, value)
}

fn price_value(vehicle: &Vehicle, value: f64) -> String {
    format!(
        "{}{:.3}/{}",
        vehicle.currency,
        value,
        vehicle.volume_unit.abbreviation()
    )
}

fn economy_abbr(vehicle: &Vehicle) -> String {
    vehicle.economy_abbreviation()
}

fn distance_abbr(vehicle: &Vehicle) -> String {
    vehicle.distance_unit.abbreviation().to_string()
}

fn volume_abbr(vehicle: &Vehicle) -> String {
    vehicle.volume_unit.abbreviation().to_string()
}

/// "Total distance (km)"
fn unit_label(
    name: &'static str,
    unit: fn(&Vehicle) -> String,
) -> impl Fn(&Vehicle) -> String + Send + Sync + 'static {
    move |vehicle: &Vehicle| format!("{} ({})", name, unit(vehicle))
}

/// "Lowest price per litre"
fn per_volume_label(name: &'static str) -> impl Fn(&Vehicle) -> String + Send + Sync + 'static {
    move |vehicle: &Vehicle| format!("{} per {}", name, vehicle.volume_unit.singular())
}

fn economy(
    key: &str,
    order: u32,
    label: &'static str,
    pick: fn(Vec<f64>) -> Option<f64>,
) -> StatisticDefinition {
    StatisticDefinition::new(key, StatGroup::Economy, order, move |vehicle, fillups| {
        Ok(pick(economy_ratios(fillups)).map(|ratio| vehicle.economy_from_ratio(ratio)))
    })
    .with_label(unit_label(label, economy_abbr))
    .with_format(economy_value)
    .with_detail(DetailView::EconomyChart)
}

/// The built-in catalog, in no particular order (the registry sorts it)
pub fn definitions() -> Vec<StatisticDefinition> {
    vec![
        // Economy
        StatisticDefinition::new("average_economy", StatGroup::Economy, 0, |vehicle, fillups| {
            Ok(average_ratio(fillups).map(|ratio| vehicle.economy_from_ratio(ratio)))
        })
        .with_label(unit_label("Average fuel economy", economy_abbr))
        .with_format(economy_value)
        .with_detail(DetailView::EconomyChart),
        economy("best_economy", 1, "Best fuel economy", |r| {
            r.into_iter().reduce(f64::max)
        }),
        economy("worst_economy", 2, "Worst fuel economy", |r| {
            r.into_iter().reduce(f64::min)
        }),
        economy("last_economy", 3, "Last fuel economy", |r| r.last().copied()),
        // Distance
        StatisticDefinition::new("total_distance", StatGroup::Distance, 0, |_, fillups| {
            Ok(total_distance(fillups))
        })
        .with_label(unit_label("Total distance", distance_abbr))
        .with_format(distance_value)
        .with_detail(DetailView::DistanceChart),
        StatisticDefinition::new("average_distance", StatGroup::Distance, 1, |_, fillups| {
            Ok(average_distance(fillups))
        })
        .with_label(unit_label("Average distance between fill-ups", distance_abbr))
        .with_format(distance_value)
        .with_detail(DetailView::DistanceChart),
        StatisticDefinition::new("distance_per_day", StatGroup::Distance, 2, |_, fillups| {
            Ok(total_distance(fillups).zip(span_days(fillups)).map(|(d, days)| d / days))
        })
        .with_label(unit_label("Distance per day", distance_abbr))
        .with_format(|vehicle, value| {
            format!("{:.1} {}/day", value, vehicle.distance_unit.abbreviation())
        }),
        // Fuel
        StatisticDefinition::new("total_volume", StatGroup::Fuel, 0, |_, fillups| {
            total_volume(fillups)
        })
        .with_label(unit_label("Total fuel", volume_abbr))
        .with_format(volume_value)
        .with_detail(DetailView::VolumeChart),
        StatisticDefinition::new("average_volume", StatGroup::Fuel, 1, |_, fillups| {
            Ok(total_volume(fillups)?.map(|v| v / fillups.len() as f64))
        })
        .with_label(unit_label("Average fill-up", volume_abbr))
        .with_format(volume_value)
        .with_detail(DetailView::VolumeChart),
        StatisticDefinition::new("fillup_count", StatGroup::Fuel, 2, |_, fillups| {
            Ok(Some(fillups.len() as f64))
        })
        .with_label(|_| "Fill-ups".to_string())
        .with_format(|_, value| format!("{:.0}", value)),
        // Cost
        StatisticDefinition::new("total_cost", StatGroup::Cost, 0, |_, fillups| {
            total_cost(fillups)
        })
        .with_label(|_| "Total cost".to_string())
        .with_format(money_value)
        .with_detail(DetailView::CostChart),
        StatisticDefinition::new("average_cost", StatGroup::Cost, 1, |_, fillups| {
            Ok(total_cost(fillups)?.map(|c| c / fillups.len() as f64))
        })
        .with_label(|_| "Average fill-up cost".to_string())
        .with_format(money_value)
        .with_detail(DetailView::CostChart),
        StatisticDefinition::new("cost_per_distance", StatGroup::Cost, 2, |_, fillups| {
            cost_per_distance(fillups)
        })
        .with_label(|vehicle| format!("Cost per {}", vehicle.distance_unit.singular()))
        .with_format(|vehicle, value| {
            format!(
                "{}{:.3}/{}",
                vehicle.currency,
                value,
                vehicle.distance_unit.abbreviation()
            )
        }),
        StatisticDefinition::new("cost_per_month", StatGroup::Cost, 3, |_, fillups| {
            let Some(days) = span_days(fillups) else {
                return Ok(None);
            };
            Ok(total_cost(fillups)?.map(|c| c / (days / DAYS_PER_MONTH)))
        })
        .with_label(|_| "Cost per month".to_string())
        .with_format(|vehicle, value| format!("{}/month", money_value(vehicle, value))),
        // Price
        StatisticDefinition::new("average_price", StatGroup::Price, 0, |_, fillups| {
            let volume = total_volume(fillups)?.filter(|v| *v > 0.0);
            Ok(total_cost(fillups)?.zip(volume).map(|(c, v)| c / v))
        })
        .with_label(per_volume_label("Average price"))
        .with_format(price_value)
        .with_detail(DetailView::PriceChart),
        StatisticDefinition::new("lowest_price", StatGroup::Price, 1, |_, fillups| {
            Ok(prices(fillups)?.into_iter().reduce(f64::min))
        })
        .with_label(per_volume_label("Lowest price"))
        .with_format(price_value)
        .with_detail(DetailView::PriceChart),
        StatisticDefinition::new("highest_price", StatGroup::Price, 2, |_, fillups| {
            Ok(prices(fillups)?.into_iter().reduce(f64::max))
        })
        .with_label(per_volume_label("Highest price"))
        .with_format(price_value)
        .with_detail(DetailView::PriceChart),
        StatisticDefinition::new("last_price", StatGroup::Price, 3, |_, fillups| {
            ensure_sane(fillups)?;
            Ok(fillups.iter().max_by_key(|f| f.date).map(|f| f.unit_price))
        })
        .with_label(per_volume_label("Last price"))
        .with_format(price_value),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DistanceUnit, EconomyUnit, VehicleId, VolumeUnit};
    use crate::statistics::StatisticRegistry;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn sample() -> Vec<Fillup> {
        vec![
            Fillup::new(day(1), 1000.0, 10.0, 3.0),
            Fillup::new(day(8), 1300.0, 10.0, 3.2),
            Fillup::new(day(12), 1450.0, 5.0, 3.4).partial(),
            Fillup::new(day(15), 1600.0, 5.0, 3.0),
        ]
    }

    fn eval(key: &str, vehicle: &Vehicle, fillups: &[Fillup]) -> Option<f64> {
        StatisticRegistry::builtin()
            .lookup(key)
            .unwrap()
            .compute(vehicle, fillups)
            .unwrap()
    }

    fn us() -> Vehicle {
        Vehicle::new(VehicleId::new(1), "Wagon")
    }

    #[test]
    fn test_intervals_merge_partial_fills() {
        let intervals = economy_intervals(&sample());
        assert_eq!(intervals, vec![(300.0, 10.0), (300.0, 10.0)]);
    }

    #[test]
    fn test_intervals_ignore_fills_before_first_full_tank() {
        let fillups = vec![
            Fillup::new(day(1), 900.0, 4.0, 3.0).partial(),
            Fillup::new(day(2), 1000.0, 10.0, 3.0),
            Fillup::new(day(5), 1250.0, 10.0, 3.0),
        ];
        assert_eq!(economy_intervals(&fillups), vec![(250.0, 10.0)]);
    }

    #[test]
    fn test_economy_statistics() {
        let vehicle = us();
        let fillups = sample();
        assert_eq!(eval("average_economy", &vehicle, &fillups), Some(30.0));
        assert_eq!(eval("best_economy", &vehicle, &fillups), Some(30.0));
        assert_eq!(eval("last_economy", &vehicle, &fillups), Some(30.0));
    }

    #[test]
    fn test_best_economy_per_100_is_lowest_consumption() {
        let vehicle = us().with_units(
            DistanceUnit::Kilometers,
            VolumeUnit::Litres,
            EconomyUnit::VolumePer100Distance,
        );
        let fillups = vec![
            Fillup::new(day(1), 0.0, 40.0, 1.8),
            Fillup::new(day(5), 500.0, 40.0, 1.8),
            Fillup::new(day(9), 1000.0, 25.0, 1.8),
        ];
        // 12.5 km/L -> 8 L/100km, 20 km/L -> 5 L/100km
        assert_eq!(eval("best_economy", &vehicle, &fillups), Some(5.0));
        assert_eq!(eval("worst_economy", &vehicle, &fillups), Some(8.0));
    }

    #[test]
    fn test_not_computable_without_enough_records() {
        let vehicle = us();
        let single = vec![Fillup::new(day(1), 1000.0, 10.0, 3.0)];

        assert_eq!(eval("average_economy", &vehicle, &single), None);
        assert_eq!(eval("total_distance", &vehicle, &single), None);
        assert_eq!(eval("distance_per_day", &vehicle, &single), None);
        assert_eq!(eval("total_volume", &vehicle, &single), Some(10.0));
        assert_eq!(eval("total_cost", &vehicle, &[]), None);
        assert_eq!(eval("fillup_count", &vehicle, &[]), Some(0.0));
    }

    #[test]
    fn test_distance_and_cost_statistics() {
        let vehicle = us();
        let fillups = sample();
        assert_eq!(eval("total_distance", &vehicle, &fillups), Some(600.0));
        assert_eq!(eval("average_distance", &vehicle, &fillups), Some(200.0));
        assert_eq!(eval("distance_per_day", &vehicle, &fillups), Some(600.0 / 14.0));

        let total = eval("total_cost", &vehicle, &fillups).unwrap();
        assert!((total - 94.0).abs() < 1e-9);

        let per_mile = eval("cost_per_distance", &vehicle, &fillups).unwrap();
        assert!((per_mile - 64.0 / 600.0).abs() < 1e-9);
    }

    #[test]
    fn test_price_statistics() {
        let vehicle = us();
        let fillups = sample();
        assert_eq!(eval("lowest_price", &vehicle, &fillups), Some(3.0));
        assert_eq!(eval("highest_price", &vehicle, &fillups), Some(3.4));
        assert_eq!(eval("last_price", &vehicle, &fillups), Some(3.0));
        let average = eval("average_price", &vehicle, &fillups).unwrap();
        assert!((average - 94.0 / 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_negative_volume_is_an_evaluation_error() {
        let vehicle = us();
        let fillups = vec![Fillup::new(day(1), 1000.0, -1.0, 3.0)];
        let registry = StatisticRegistry::builtin();
        let result = registry
            .lookup("total_volume")
            .unwrap()
            .compute(&vehicle, &fillups);
        assert!(result.is_err());
    }

    #[test]
    fn test_labels_and_formats_follow_vehicle_units() {
        let registry = StatisticRegistry::builtin();
        let metric = us()
            .with_units(
                DistanceUnit::Kilometers,
                VolumeUnit::Litres,
                EconomyUnit::VolumePer100Distance,
            )
            .with_currency("€");

        let cost = registry.lookup("cost_per_distance").unwrap();
        assert_eq!(cost.label(&metric), "Cost per kilometer");
        assert_eq!(cost.format(&metric, 0.1234), "€0.123/km");

        let economy = registry.lookup("average_economy").unwrap();
        assert_eq!(economy.label(&metric), "Average fuel economy (L/100km)");
        assert_eq!(economy.label(&us()), "Average fuel economy (MPG)");
        assert_eq!(economy.format(&metric, 6.25), "6.25 L/100km");

        let best = registry.lookup("best_economy").unwrap();
        assert_eq!(best.label(&metric), "Best fuel economy (L/100km)");

        let distance = registry.lookup("total_distance").unwrap();
        assert_eq!(distance.label(&metric), "Total distance (km)");
        assert_eq!(distance.label(&us()), "Total distance (mi)");

        let fuel = registry.lookup("total_volume").unwrap();
        assert_eq!(fuel.label(&metric), "Total fuel (L)");

        let lowest = registry.lookup("lowest_price").unwrap();
        assert_eq!(lowest.label(&metric), "Lowest price per litre");
        assert!(economy.has_detail());

        let count = registry.lookup("fillup_count").unwrap();
        assert_eq!(count.format(&metric, 12.0), "12");
        assert!(!count.has_detail());
    }

    #[test]
    fn test_catalog_groups_are_contiguous_and_ordered() {
        let registry = StatisticRegistry::builtin();
        let positions: Vec<_> = registry
            .all()
            .iter()
            .map(|d| (d.group(), d.order()))
            .collect();
        let mut sorted = positions.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(positions, sorted, "positions must be sorted and unique");
        assert_eq!(registry.all()[0].key(), "average_economy");
    }
}
