use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDate};

use crate::cost_elements::{
    self, display_resource, AFUDC_BORROWED, AFUDC_EQUITY, LABOR_OH_RESOURCE,
};
use crate::error::{Result, Sap2HbError, UnknownOperation};
use crate::fmt::hours;
use crate::models::{ActualsRow, BoeNoteRow, CostType, ResourceRow, SapRecord};
use crate::operations::{self, AFUDC_BID_ITEM, AFUDC_OPERATION};
use crate::settings::{Settings, BOE_NOTE_TEMPLATE};

/// Values below this are treated as zero when deciding whether an
/// overhead or AFUDC line exists.
const EPSILON: f64 = 1e-10;

/// Tolerance when reconciling input cost against output cost.
const RECONCILE_TOLERANCE: f64 = 0.005;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    pub order: String,
    pub input_rows: usize,
    pub buckets: usize,
    pub overhead_rows: usize,
    pub afudc_rows: usize,
    pub input_total: f64,
    pub output_total: f64,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub actuals: Vec<ActualsRow>,
    pub boe: Vec<BoeNoteRow>,
    pub resources: Vec<ResourceRow>,
    pub summary: Summary,
}

/// Aggregation of all records sharing an (activity, resource) key.
#[derive(Debug, Clone)]
struct Bucket {
    bid_item: u32,
    activity: &'static str,
    resource: String,
    cost_element: String,
    description: String,
    cost_type: CostType,
    quantity: f64,
    amount: f64,
}

pub fn unit_price(amount: f64, quantity: f64) -> f64 {
    if quantity != 0.0 {
        amount / quantity
    } else {
        amount
    }
}

pub fn boe_note(resource: &str, quantity: f64) -> String {
    BOE_NOTE_TEMPLATE
        .replace("{resource}", display_resource(resource))
        .replace("{hours}", &hours(quantity))
}

/// Date stamp used on BoE notes, e.g. `1/7/26`.
pub fn note_date(date: NaiveDate) -> String {
    format!("{}/{}/{}", date.month(), date.day(), date.format("%y"))
}

fn check_operations(records: &[SapRecord]) -> Result<()> {
    let mut unknown: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    for r in records {
        if r.operation != AFUDC_OPERATION && !operations::is_valid_operation(r.operation) {
            unknown.entry(r.operation).or_default().push(r.row);
        }
    }
    if unknown.is_empty() {
        return Ok(());
    }
    Err(Sap2HbError::UnknownOperations(
        unknown
            .into_iter()
            .map(|(code, rows)| UnknownOperation { code, rows })
            .collect(),
    ))
}

fn lump_sum(
    settings: &Settings,
    bid_item: u32,
    activity: String,
    resource: &str,
    amount: f64,
    supp_desc: Option<String>,
    description: &str,
    cost_type: CostType,
) -> ActualsRow {
    ActualsRow {
        bid_item,
        activity,
        resource: resource.to_string(),
        quantity: 1.0,
        units: settings.lump_sum_unit.clone(),
        unit_price: amount,
        tax_ot_percent: settings.tax_ot_percent,
        pieces: 1,
        supp_desc,
        description: description.to_string(),
        cost_type,
    }
}

fn bucket_row(settings: &Settings, b: &Bucket) -> ActualsRow {
    let supp_desc = Some(b.cost_element.clone());
    if b.cost_type != CostType::Labor {
        return lump_sum(
            settings,
            b.bid_item,
            b.activity.to_string(),
            &b.resource,
            b.amount,
            supp_desc,
            &b.description,
            b.cost_type,
        );
    }
    ActualsRow {
        bid_item: b.bid_item,
        activity: b.activity.to_string(),
        resource: b.resource.clone(),
        quantity: b.quantity,
        units: settings.labor_unit.clone(),
        unit_price: unit_price(b.amount, b.quantity),
        tax_ot_percent: settings.tax_ot_percent,
        pieces: 1,
        supp_desc,
        description: b.description.clone(),
        cost_type: b.cost_type,
    }
}

fn extract_resources(actuals: &[ActualsRow], warnings: &mut Vec<String>) -> Vec<ResourceRow> {
    let mut seen: HashMap<&str, &ActualsRow> = HashMap::new();
    let mut resources = Vec::new();
    let mut conflicted: Vec<&str> = Vec::new();

    for row in actuals {
        if let Some(first) = seen.get(row.resource.as_str()) {
            let differs = first.description != row.description || first.cost_type != row.cost_type;
            if differs && !conflicted.contains(&row.resource.as_str()) {
                conflicted.push(row.resource.as_str());
                warnings.push(format!(
                    "Resource {} has conflicting descriptions ('{}' vs '{}'); keeping the first",
                    row.resource, first.description, row.description
                ));
            }
            continue;
        }
        let body = if row.cost_type == CostType::Labor {
            display_resource(&row.resource)
        } else {
            row.description.as_str()
        };
        seen.insert(row.resource.as_str(), row);
        resources.push(ResourceRow {
            code: row.resource.clone(),
            description: format!("{}{}", row.cost_type.resource_prefix(), body),
            unit: row.units.clone(),
        });
    }
    resources
}

/// Convert SAP line items into the three HeavyBid tables.
///
/// Records are validated against the operation table first; any unknown
/// operation aborts the whole run. Buckets, and therefore Actuals rows, are
/// emitted in first-seen order of their (activity, resource) key, followed
/// by labor overhead and AFUDC lines.
pub fn transform(records: &[SapRecord], settings: &Settings, run_date: NaiveDate) -> Result<Conversion> {
    if records.is_empty() {
        return Err(Sap2HbError::EmptyInput);
    }
    check_operations(records)?;

    let mut summary = Summary {
        order: records[0].order.clone(),
        input_rows: records.len(),
        ..Summary::default()
    };
    let mut other_orders: Vec<&str> = Vec::new();

    let mut buckets: Vec<Bucket> = Vec::new();
    let mut index: HashMap<(&'static str, String), usize> = HashMap::new();
    let mut overhead: BTreeMap<u32, f64> = BTreeMap::new();
    let (mut afudc_borrowed, mut afudc_equity) = (0.0_f64, 0.0_f64);
    let mut dropped_afudc = 0usize;

    for r in records {
        summary.input_total += r.amount;
        if r.order != summary.order && !other_orders.contains(&r.order.as_str()) {
            other_orders.push(&r.order);
        }

        if r.operation == AFUDC_OPERATION {
            match cost_elements::element_code(&r.cost_element) {
                Some(AFUDC_BORROWED) => afudc_borrowed += r.amount,
                Some(AFUDC_EQUITY) => afudc_equity += r.amount,
                _ => dropped_afudc += 1,
            }
            continue;
        }

        let Some(entry) = operations::lookup_raw(r.operation) else {
            continue;
        };

        if cost_elements::is_overhead(&r.cost_element) {
            *overhead.entry(entry.code).or_default() += r.amount;
            continue;
        }

        let resource =
            cost_elements::resource_code(&r.cost_element, r.partner_cctr, &r.cost_element_name);
        let key = (entry.activity, resource);
        match index.get(&key) {
            Some(&i) => {
                let b = &mut buckets[i];
                b.quantity += r.quantity;
                b.amount += r.amount;
            }
            None => {
                let description = if r.cost_element_name.is_empty() {
                    r.cost_element.clone()
                } else {
                    r.cost_element_name.clone()
                };
                index.insert(key.clone(), buckets.len());
                buckets.push(Bucket {
                    bid_item: entry.code,
                    activity: entry.activity,
                    resource: key.1,
                    cost_element: r.cost_element.clone(),
                    description,
                    cost_type: cost_elements::cost_type(&r.cost_element),
                    quantity: r.quantity,
                    amount: r.amount,
                });
            }
        }
    }

    if buckets.is_empty() {
        return Err(Sap2HbError::EmptyInput);
    }
    summary.buckets = buckets.len();

    if !other_orders.is_empty() {
        summary.warnings.push(format!(
            "Export contains more than one Order; output is named for {} (also saw {})",
            summary.order,
            other_orders.join(", ")
        ));
    }

    let mut actuals: Vec<ActualsRow> = buckets.iter().map(|b| bucket_row(settings, b)).collect();

    // Labor overhead, one line per activity that carries it.
    let mut activities: Vec<(u32, &'static str)> = Vec::new();
    for b in &buckets {
        if !activities.contains(&(b.bid_item, b.activity)) {
            activities.push((b.bid_item, b.activity));
        }
    }
    for (bid_item, activity) in &activities {
        let Some(value) = overhead.remove(bid_item) else {
            continue;
        };
        if value.abs() > EPSILON {
            actuals.push(lump_sum(
                settings,
                *bid_item,
                activity.to_string(),
                LABOR_OH_RESOURCE,
                value,
                None,
                cost_elements::LABOR_ALLOC_ELEMENT,
                CostType::LaborAlloc,
            ));
            summary.overhead_rows += 1;
        }
    }
    for (code, value) in &overhead {
        if value.abs() > EPSILON {
            summary.warnings.push(format!(
                "Labor overhead of {value:.2} on operation {code} has no other cost lines and was not carried over"
            ));
        }
    }

    // AFUDC from operation 1, booked on the sibling activity of bid item 1010.
    if dropped_afudc > 0 {
        summary.warnings.push(format!(
            "{dropped_afudc} row(s) on operation {AFUDC_OPERATION} were not AFUDC cost elements and were skipped"
        ));
    }
    let afudc_lines = [
        (afudc_borrowed, "6AFUDC-Bo", AFUDC_BORROWED, "AFUDC-Borrowed"),
        (afudc_equity, "6AFUDC-Eq", AFUDC_EQUITY, "AFUDC-Equity"),
    ];
    if afudc_lines.iter().any(|(v, ..)| v.abs() > EPSILON) {
        let base = buckets
            .iter()
            .any(|b| b.bid_item == AFUDC_BID_ITEM)
            .then(|| operations::lookup(AFUDC_BID_ITEM))
            .flatten();
        match base {
            Some(entry) => {
                let activity = operations::afudc_activity(entry);
                for (value, resource, element, description) in afudc_lines {
                    if value.abs() > EPSILON {
                        actuals.push(lump_sum(
                            settings,
                            AFUDC_BID_ITEM,
                            activity.clone(),
                            resource,
                            value,
                            Some(element.to_string()),
                            description,
                            CostType::Afudc,
                        ));
                        summary.afudc_rows += 1;
                    }
                }
            }
            None => summary.warnings.push(format!(
                "AFUDC postings found but bid item {AFUDC_BID_ITEM} has no cost lines; AFUDC was not carried over"
            )),
        }
    }

    let date = note_date(run_date);
    let boe: Vec<BoeNoteRow> = buckets
        .iter()
        .filter(|b| b.cost_type == CostType::Labor)
        .map(|b| BoeNoteRow {
            bid_item: b.bid_item,
            activity: b.activity.to_string(),
            date: date.clone(),
            notes: boe_note(&b.resource, b.quantity),
        })
        .collect();

    let resources = extract_resources(&actuals, &mut summary.warnings);

    summary.output_total = actuals.iter().map(|a| a.quantity * a.unit_price).sum();
    let gap = summary.input_total - summary.output_total;
    if gap.abs() > RECONCILE_TOLERANCE {
        summary.warnings.push(format!(
            "Output cost differs from SAP total by {gap:.2} (input {:.2}, output {:.2})",
            summary.input_total, summary.output_total
        ));
    }

    log::debug!(
        "{} buckets, {} overhead, {} AFUDC, {} BoE notes, {} resources",
        summary.buckets,
        summary.overhead_rows,
        summary.afudc_rows,
        boe.len(),
        resources.len()
    );

    Ok(Conversion {
        actuals,
        boe,
        resources,
        summary,
    })
}
