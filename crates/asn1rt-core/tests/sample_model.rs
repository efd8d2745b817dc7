use std::fs;
use std::path::Path;

use asn1rt_core::{
    ConstraintId, TypeKind, TypeModule, assign_constraint_ids, build_reference_graph_report,
    validate_module,
};

fn load_model(name: &str) -> TypeModule {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../models")
        .join(name);
    let contents = fs::read_to_string(&path)
        .unwrap_or_else(|_| panic!("missing model at {}", path.display()));
    serde_json::from_str(&contents).expect("parse model json")
}

fn clear_ids(module: &mut TypeModule) {
    fn clear(node: &mut asn1rt_core::TypeNode) {
        node.id = ConstraintId::NONE;
        if let TypeKind::Sequence(sequence) = &mut node.kind {
            for field in &mut sequence.fields {
                clear(&mut field.ty);
            }
        }
    }
    for assignment in &mut module.types {
        clear(&mut assignment.ty);
    }
}

#[test]
fn sample_model_is_well_formed() {
    let module = load_model("sample.model.json");
    validate_module(&module).expect("sample model should validate");

    let message = module.require("Message").expect("Message declared");
    assert_eq!(message.ty.id, ConstraintId(26));
    let TypeKind::Sequence(sequence) = &message.ty.kind else {
        panic!("Message should be a sequence");
    };
    let names: Vec<_> = sequence.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["msgId", "myflag", "value", "szDescription", "isReady"]
    );
}

#[test]
fn id_allocation_reproduces_sample_numbering() {
    let numbered = load_model("sample.model.json");
    let mut module = numbered.clone();
    clear_ids(&mut module);

    assert_eq!(assign_constraint_ids(&mut module), 6);
    assert_eq!(module, numbered);
}

#[test]
fn telemetry_model_orders_dependencies() {
    let module = load_model("telemetry.model.json");
    validate_module(&module).expect("telemetry model should validate");

    let report = build_reference_graph_report(&module);
    let order = report.dependency_order.expect("acyclic");
    assert_eq!(order, vec!["DeviceAddress", "OnOffCommand", "Report"]);
}
