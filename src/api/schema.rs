use crate::api::error::SchemaError;

#[cfg(feature = "json")]
pub mod json;

pub trait Schema: Send + Sync + 'static {
    fn schema_type() -> SchemaType;
}

pub enum SchemaType {
    Text,
    Binary,
}

pub trait Deserialize<S>
where
    S: Schema,
    Self: Sized,
{
    fn deserialize(buf: &[u8]) -> Result<Self, SchemaError>;
}

pub trait Serialize<S>
where
    S: Schema,
{
    fn serialize(&self) -> Result<Vec<u8>, SchemaError>;
}
