//! Tests for the JSON registry dump.

use quickstep::{DataTable, FeatureSteps, RegistryBuilder, StepFault, StepRegistry, step_future};
use serde_json::Value;

struct Warehouse;

impl FeatureSteps for Warehouse {
    fn create() -> Result<Self, StepFault> {
        Ok(Self)
    }

    fn register(steps: &mut RegistryBuilder<Self>) {
        steps
            .given(r"(\d+) crates of (\w+)", |_: &mut Self, (_n, _item): (u32, String)| {})
            .named("stock")
            .and(r"another (\d+) crates of (\w+)");
        steps
            .awaitable(|_: &mut Self, (_table,): (DataTable,)| step_future(async { Ok(()) }))
            .named("inventory")
            .then("the inventory lists:");
    }
}

fn dump() -> Value {
    let registry = StepRegistry::<Warehouse>::build()
        .unwrap_or_else(|err| panic!("registry should build: {err}"));
    let json = registry
        .dump()
        .unwrap_or_else(|err| panic!("dump should serialise: {err}"));
    serde_json::from_str(&json).unwrap_or_else(|err| panic!("dump should be JSON: {err}"))
}

#[test]
fn dump_lists_every_declaration_in_order() {
    let value = dump();
    assert_eq!(value.get("owner").and_then(Value::as_str), Some("Warehouse"));
    let declarations = value
        .get("declarations")
        .and_then(Value::as_array)
        .unwrap_or_else(|| panic!("declarations should be an array"));
    let summary: Vec<(&str, &str, &str)> = declarations
        .iter()
        .map(|entry| {
            let field = |name: &str| entry.get(name).and_then(Value::as_str).unwrap_or_default();
            (field("keyword"), field("handler"), field("kind"))
        })
        .collect();
    assert_eq!(
        summary,
        [
            ("Given", "stock", "blocking"),
            ("And", "stock", "blocking"),
            ("Then", "inventory", "awaitable"),
        ]
    );
}

#[test]
fn dump_describes_parameters() {
    let value = dump();
    let params = value
        .pointer("/declarations/0/params")
        .and_then(Value::as_array)
        .unwrap_or_else(|| panic!("params should be an array"));
    let kinds: Vec<&str> = params
        .iter()
        .filter_map(|param| param.get("kind").and_then(Value::as_str))
        .collect();
    assert_eq!(kinds, ["integer", "text"]);
    assert_eq!(
        value
            .pointer("/declarations/2/params/0/kind")
            .and_then(Value::as_str),
        Some("data table")
    );
}
