use serde_json::{Value, json};

/// Name of the single function the model is forced to call
pub const FUNCTION_NAME: &str = "create_quiz";

/// The `create_quiz` function declaration sent with every request
pub fn function_schema() -> Value {
    json!({
        "name": FUNCTION_NAME,
        "description": "function that takes a list of questions and answers and return a quiz",
        "parameters": {
            "type": "object",
            "properties": {
                "questions": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "question": {"type": "string"},
                            "answers": {
                                "type": "array",
                                "items": {
                                    "type": "object",
                                    "properties": {
                                        "answer": {"type": "string"},
                                        "correct": {"type": "boolean"}
                                    },
                                    "required": ["answer", "correct"]
                                }
                            }
                        },
                        "required": ["question", "answers"]
                    }
                }
            },
            "required": ["questions"]
        }
    })
}

/// Forces the model to answer through `create_quiz`
pub fn function_call() -> Value {
    json!({ "name": FUNCTION_NAME })
}
