use serde::de::DeserializeOwned;
use serde::Serialize;

pub fn encode<T>(value: &T) -> Option<String>
where
    T: Serialize,
{
    serde_json::to_string(value).ok()
}

pub fn decode<T>(text: &str) -> Option<T>
where
    T: DeserializeOwned,
{
    serde_json::from_str(text).ok()
}
