//! JSON schema generation for constrained model output.
//!
//! Strict `json_schema` response formats require:
//! 1. `additionalProperties: false` on every object schema
//! 2. every property listed in `required`
//! 3. fully inlined schemas (no `$ref`)

use schemars::{JsonSchema, schema_for};
use serde_json::{Map, Value};

/// Build a strict, self-contained JSON schema for `T`.
pub fn strict_schema<T: JsonSchema>() -> Value {
    let schema = schema_for!(T);
    let mut value = serde_json::to_value(schema).unwrap_or_default();

    let definitions = match &mut value {
        Value::Object(map) => {
            map.remove("$schema");
            map.remove("definitions")
        }
        _ => None,
    };
    if let Some(defs) = definitions {
        inline_refs(&mut value, &defs);
    }
    flatten_single_all_of(&mut value);
    fix_object_schemas(&mut value);
    value
}

fn inline_refs(value: &mut Value, definitions: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(path)) = map.get("$ref").cloned() {
                let name = path.trim_start_matches("#/definitions/");
                if let Some(def) = definitions.get(name) {
                    let mut resolved = def.clone();
                    inline_refs(&mut resolved, definitions);
                    map.remove("$ref");
                    if let Value::Object(resolved) = resolved {
                        for (k, v) in resolved {
                            map.entry(k).or_insert(v);
                        }
                    }
                }
            }
            for (_, v) in map.iter_mut() {
                inline_refs(v, definitions);
            }
        }
        Value::Array(items) => {
            for item in items {
                inline_refs(item, definitions);
            }
        }
        _ => {}
    }
}

/// Documented fields come out as `{"description": .., "allOf": [<schema>]}`;
/// merge the single branch into its parent.
fn flatten_single_all_of(value: &mut Value) {
    match value {
        Value::Object(map) => {
            if let Some(Value::Array(branches)) = map.get("allOf") {
                if let [Value::Object(inner)] = branches.as_slice() {
                    let inner: Map<String, Value> = inner.clone();
                    map.remove("allOf");
                    for (k, v) in inner {
                        map.entry(k).or_insert(v);
                    }
                }
            }
            for (_, v) in map.iter_mut() {
                flatten_single_all_of(v);
            }
        }
        Value::Array(items) => {
            for item in items {
                flatten_single_all_of(item);
            }
        }
        _ => {}
    }
}

fn fix_object_schemas(value: &mut Value) {
    match value {
        Value::Object(map) => {
            if map.get("type") == Some(&Value::String("object".to_string())) {
                map.insert("additionalProperties".to_string(), Value::Bool(false));
                if let Some(Value::Object(props)) = map.get_mut("properties") {
                    // Strict mode rejects `default`, which schemars emits for `#[serde(default)]`.
                    for prop in props.values_mut() {
                        if let Value::Object(prop) = prop {
                            prop.remove("default");
                        }
                    }
                    let keys: Vec<Value> = props.keys().cloned().map(Value::String).collect();
                    map.insert("required".to_string(), Value::Array(keys));
                }
            }
            for (_, v) in map.iter_mut() {
                fix_object_schemas(v);
            }
        }
        Value::Array(items) => {
            for item in items {
                fix_object_schemas(item);
            }
        }
        _ => {}
    }
}
