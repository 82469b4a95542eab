use serde_json::Value;
use std::any::Any;

/// Read-only typed view over one decoded response payload.
///
/// Capabilities declare the model they produce; [`Bot::do_request`] builds it
/// from the decoded body. Jobs hand models back as `Box<dyn Model>`; callers
/// recover the concrete type with [`downcast_ref`](dyn Model::downcast_ref).
/// Models are never cached.
///
/// [`Bot::do_request`]: crate::Bot::do_request
pub trait Model: Send + Sync + 'static {
    fn from_json(json: Value) -> Self
    where
        Self: Sized;

    /// The payload the model was built from.
    fn json(&self) -> &Value;

    fn as_any(&self) -> &dyn Any;
}

impl dyn Model {
    /// The concrete model, if it is a `T`.
    pub fn downcast_ref<T: Model>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

impl std::fmt::Debug for dyn Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Model").field(self.json()).finish()
    }
}

/// Untyped payload, for capabilities that don't declare a model.
impl Model for Value {
    fn from_json(json: Value) -> Self {
        json
    }

    fn json(&self) -> &Value {
        self
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_boxed_model_downcasts_to_its_type() {
        let model: Box<dyn Model> = Box::new(Value::from_json(json!({"id": "1"})));
        assert_eq!(model.json()["id"], "1");
        assert!(model.downcast_ref::<Value>().is_some());
    }
}
