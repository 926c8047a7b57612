// Forces ts-rs TypeScript emission for every type the dashboard consumes.
use catalog_pulse::domain::events::{EngineEvent, MetricsEvent, ProbeEvent, ProbeProgress};
use catalog_pulse::domain::metrics::{
    CategoryMetrics, PricingSummary, StockSummary, StructureKind,
};
use catalog_pulse::domain::{Category, ProbeTally, ProductView, ValidityRecord, ValidityStatus};
use ts_rs::TS;

fn main() {
    // ts-rs only writes .ts files when export_all_to (or export) runs, so
    // each shared type is exported here explicitly.
    Category::export_all().expect("export Category");
    ValidityStatus::export_all().expect("export ValidityStatus");
    ValidityRecord::export_all().expect("export ValidityRecord");
    ProbeTally::export_all().expect("export ProbeTally");
    ProbeProgress::export_all().expect("export ProbeProgress");
    ProbeEvent::export_all().expect("export ProbeEvent");
    MetricsEvent::export_all().expect("export MetricsEvent");
    EngineEvent::export_all().expect("export EngineEvent");
    StructureKind::export_all().expect("export StructureKind");
    PricingSummary::export_all().expect("export PricingSummary");
    StockSummary::export_all().expect("export StockSummary");
    CategoryMetrics::export_all().expect("export CategoryMetrics");
    ProductView::export_all().expect("export ProductView");

    println!("TypeScript bindings generated");
}
