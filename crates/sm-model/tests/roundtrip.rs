use sm_model::*;

fn sample_environment() -> Environment {
    Environment {
        submodels: vec![Submodel {
            id: "https://example.com/ids/sm/4163_9072_2032_6099".to_string(),
            id_short: Some("SimulationModels".to_string()),
            semantic_id: Some(Reference::global(
                "https://admin-shell.io/idta/SimulationModels/SimulationModels/1/0",
            )),
            submodel_elements: vec![SubmodelElement::SubmodelElementCollection(
                ElementCollection {
                    id_short: Some("SimulationModel01".to_string()),
                    semantic_id: Some(Reference::global(
                        "https://admin-shell.io/idta/SimulationModels/SimulationModel/1/0",
                    )),
                    qualifiers: vec![],
                    value: vec![SubmodelElement::File(File {
                        id_short: "ParamFile".to_string(),
                        semantic_id: None,
                        content_type: Some("text/plain".to_string()),
                        value: Some("/aasx/params.txt".to_string()),
                    })],
                },
            )],
        }],
    }
}

#[test]
fn roundtrip_yaml_environment() {
    let environment = sample_environment();
    let path = std::env::temp_dir().join("sm_model_roundtrip.yaml");

    save_yaml(&path, &environment).unwrap();
    let loaded = load_yaml(&path).unwrap();

    assert_eq!(environment, loaded);
}

#[test]
fn roundtrip_json_environment() {
    let environment = sample_environment();
    let path = std::env::temp_dir().join("sm_model_roundtrip.json");

    save_json(&path, &environment).unwrap();
    let loaded = load_environment(&path).unwrap();

    assert_eq!(environment, loaded);
}

#[test]
fn parses_host_style_json() {
    let json = r#"{
        "submodels": [{
            "id": "urn:sm:1",
            "submodelElements": [{
                "modelType": "Operation",
                "idShort": "Ball",
                "inputVariables": [{
                    "value": {"modelType": "Property", "idShort": "stepCount", "valueType": "xs:integer", "value": "3"}
                }]
            }]
        }]
    }"#;
    let environment: Environment = serde_json::from_str(json).unwrap();
    let op = environment.submodels[0].operation("Ball").unwrap();
    let step_count = op.input_variables[0].value.as_property().unwrap();
    assert_eq!(step_count.value_type, DataType::Integer);
    assert_eq!(step_count.value.as_deref(), Some("3"));
}
