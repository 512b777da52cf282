use serde::{ser::SerializeStruct, Serialize, Serializer};

use crate::core::{Output, ParseState};

impl<T: Serialize> Serialize for Output<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Output::Value(v) => v.serialize(serializer),
            Output::List(items) => serializer.collect_seq(items),
        }
    }
}

impl<T: Serialize> Serialize for ParseState<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ParseState", 5)?;
        state.serialize_field("text", self.text())?;
        state.serialize_field("position", &self.position())?;
        state.serialize_field("result", self.result())?;
        state.serialize_field("error", &self.error_message())?;
        state.serialize_field("failed", &self.failed())?;
        state.end()
    }
}
