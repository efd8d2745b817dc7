use asn1rt_plan::model_json_schema;

fn main() {
    let schema = model_json_schema();
    let json = serde_json::to_string_pretty(&schema).expect("serialize model json schema");
    println!("{json}");
}
