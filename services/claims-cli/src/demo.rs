use crate::infra::{print_json, Runtime};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use clap::Args;
use rail_claims::claims::{ClaimReport, ClaimRequest};
use rail_claims::error::AppError;
use serde_json::{json, Value};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Travel date used for every demo journey (YYYY-MM-DD). Defaults to 2025-03-10.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) travel_date: Option<NaiveDate>,
    /// Print the full JSON report for each scenario.
    #[arg(long)]
    pub(crate) json: bool,
}

struct DemoCase {
    title: &'static str,
    request: Value,
}

pub(crate) fn run_demo(runtime: &Runtime, args: DemoArgs) -> Result<(), AppError> {
    let travel_date = args
        .travel_date
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(2025, 3, 10).unwrap_or_default());
    let service = runtime.service();

    println!("Rail compensation demo ({travel_date})");
    println!(
        "Service fee {}% ({:?}), tables from {}",
        runtime.config.engine.service_fee_pct,
        runtime.config.engine.fee_mode,
        runtime.data_dir().display()
    );

    for case in demo_cases(travel_date) {
        let request = ClaimRequest::from_value(case.request)?;
        let report = service.compute(&request);
        println!("\n{}", case.title);
        render_report(&report);
        if args.json {
            print_json(&report, false)?;
        }
    }

    Ok(())
}

fn render_report(report: &ClaimReport) {
    let breakdown = &report.result.breakdown;
    let totals = &report.result.totals;

    println!(
        "- scope {} | delay {} min | {}% via {:?}",
        report.profile.scope(),
        breakdown.compensation.delay_minutes,
        breakdown.compensation.pct,
        report.eligibility.source
    );
    println!(
        "- refund {:.2} | compensation {:.2} on {:.2} ({}) | expenses {:.2}",
        breakdown.refund.amount,
        breakdown.compensation.amount,
        breakdown.compensation.basis_amount,
        breakdown.compensation.basis,
        breakdown.expenses.total
    );
    println!(
        "- gross {:.2} {} | fee {:.2} | net {:.2}",
        totals.gross_claim, totals.currency, totals.service_fee_amount, totals.net_to_client
    );
    if let Some(eur) = totals.eur_equivalent {
        println!("- approx. {eur:.2} EUR");
    }
    println!("- form {} ({})", report.form.form, report.form.reason);
    for note in report.profile.notes() {
        println!("  note: {note}");
    }
    if report.result.flags.manual_review {
        println!("  manual review requested");
    }
    if !report.missing.is_empty() {
        println!("  open questions: {}", report.missing.join(", "));
    }
}

fn stamp(date: NaiveDate, hour: i64, minute: i64) -> String {
    let at: NaiveDateTime =
        date.and_time(NaiveTime::MIN) + Duration::hours(hour) + Duration::minutes(minute);
    at.format("%Y-%m-%dT%H:%M").to_string()
}

fn demo_cases(date: NaiveDate) -> Vec<DemoCase> {
    let return_date = date + Duration::days(2);
    vec![
        DemoCase {
            title: "A. Hamburg to Berlin, 125 minutes late",
            request: json!({
                "journey": {
                    "country": "DE",
                    "operator": "DB",
                    "service_scope": "long_domestic",
                    "ticket_price_total": 100,
                    "segments": [{
                        "country": "DE", "operator": "DB",
                        "from": "Hamburg Hbf", "to": "Berlin Hbf",
                        "scheduled_departure": stamp(date, 8, 0),
                        "scheduled_arrival": stamp(date, 10, 0),
                        "actual_arrival": stamp(date, 12, 5)
                    }]
                }
            }),
        },
        DemoCase {
            title: "B. Swedish regional trip of 120 km, 90 minutes late",
            request: json!({
                "journey": {
                    "country": "SE",
                    "operator": "Norrtag",
                    "currency": "SEK",
                    "distance_km": 120,
                    "ticket_price_total": 120,
                    "segments": [{
                        "country": "SE", "operator": "Norrtag",
                        "from": "Umea", "to": "Vannas",
                        "scheduled_departure": stamp(date, 8, 0),
                        "scheduled_arrival": stamp(date, 9, 0)
                    }]
                },
                "disruption": {"delay_minutes": 90}
            }),
        },
        DemoCase {
            title: "C. Return ticket, outbound leg 130 minutes late",
            request: json!({
                "journey": {
                    "country": "DE",
                    "operator": "DB",
                    "service_scope": "long_domestic",
                    "ticket_price_total": 200,
                    "return_ticket": true,
                    "segments": [
                        {"country": "DE", "operator": "DB", "scheduled_arrival": stamp(date, 10, 0)},
                        {"country": "DE", "operator": "DB", "scheduled_arrival": stamp(return_date, 18, 0)}
                    ]
                },
                "disruption": {"delay_minutes": 130}
            }),
        },
        DemoCase {
            title: "D. Refund chosen after a 65 minute delay",
            request: json!({
                "journey": {
                    "country": "DE",
                    "operator": "DB",
                    "service_scope": "long_domestic",
                    "ticket_price_total": 80,
                    "segments": [{"country": "DE", "operator": "DB", "scheduled_departure": stamp(date, 8, 0)}]
                },
                "disruption": {"delay_minutes": 65},
                "choices": {"wants_refund": true}
            }),
        },
    ]
}
