//! The "jsonpickle" `Any` backend: serializes the whole value as JSON
//! directly into `Any.value`, the analogue of the source's `jsonpickle`
//! module (which serializes an object graph to human-readable JSON rather
//! than a structural pickle).

use crate::error::ProtobufError;
use crate::error::ProtobufResult;

pub fn pack<T: serde::Serialize>(value: &T) -> ProtobufResult<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| ProtobufError::Unpackable(e.to_string()))
}

pub fn unpack<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> ProtobufResult<T> {
    serde_json::from_slice(bytes).map_err(|e| ProtobufError::Unpackable(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde::Serialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[test]
    fn round_trips_a_struct() {
        let point = Point { x: 3, y: 4 };
        let bytes = pack(&point).unwrap();
        let back: Point = unpack(&bytes).unwrap();
        assert_eq!(point, back);
    }
}
