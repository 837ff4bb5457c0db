/// Serialize a `mime::Mime` as its string form, e.g. `"video/mp4"`.
pub(crate) mod mime_as_string {
    use mime::Mime;
    use serde::{self, de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Mime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(value.essence_str())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Mime, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer)?
            .parse()
            .map_err(de::Error::custom)
    }
}
