use super::*;

#[test]
fn parse_decodes_predictions() {
    let json = serde_json::json!({
        "predictions": [
            { "bytesBase64Encoded": "iVBORw==", "mimeType": "image/png" },
            { "bytesBase64Encoded": "AAEC", "mimeType": "image/png" }
        ]
    })
    .to_string();
    let images = parse_predict_response(&json).unwrap();
    assert_eq!(images.len(), 2);
    assert_eq!(images[0], vec![0x89, b'P', b'N', b'G']);
    assert_eq!(images[1], vec![0, 1, 2]);
}

#[test]
fn parse_skips_filtered_predictions() {
    let json = serde_json::json!({
        "predictions": [
            { "raiFilteredReason": "blocked" },
            { "bytesBase64Encoded": "AAEC" }
        ]
    })
    .to_string();
    let images = parse_predict_response(&json).unwrap();
    assert_eq!(images, vec![vec![0, 1, 2]]);
}

#[test]
fn parse_empty_response_is_error() {
    let err = parse_predict_response("{}").unwrap_err();
    assert!(matches!(err, GenerationError::Empty));
}

#[test]
fn parse_bad_base64_is_error() {
    let json = serde_json::json!({ "predictions": [{ "bytesBase64Encoded": "***" }] }).to_string();
    let err = parse_predict_response(&json).unwrap_err();
    assert!(matches!(err, GenerationError::ApiParse(_)));
}

#[test]
fn parse_invalid_json_is_error() {
    let err = parse_predict_response("not json").unwrap_err();
    assert!(matches!(err, GenerationError::ApiParse(_)));
}

#[test]
fn request_body_uses_camel_case_parameters() {
    let body = PredictRequest {
        instances: [Instance { prompt: "a red apple" }],
        parameters: Parameters { sample_count: 1, aspect_ratio: "16:9" },
    };
    let value = serde_json::to_value(&body).unwrap();
    assert_eq!(value["instances"][0]["prompt"], "a red apple");
    assert_eq!(value["parameters"]["sampleCount"], 1);
    assert_eq!(value["parameters"]["aspectRatio"], "16:9");
}
