use heapless::String as HeaplessString;
use sqlx::postgres::PgRow;
use sqlx::Row;
use std::error::Error;

/// Manual row mapping for models carrying bounded strings, which sqlx cannot
/// decode through a derive.
pub trait TryFromRow<R>: Sized {
    fn try_from_row(row: &R) -> Result<Self, Box<dyn Error + Send + Sync>>;
}

pub fn get_heapless_string<const N: usize>(
    row: &PgRow,
    column: &str,
) -> Result<HeaplessString<N>, Box<dyn Error + Send + Sync>> {
    let value: String = row.try_get(column)?;
    HeaplessString::try_from(value.as_str())
        .map_err(|_| format!("column {column} exceeds {N} characters").into())
}

pub fn get_optional_heapless_string<const N: usize>(
    row: &PgRow,
    column: &str,
) -> Result<Option<HeaplessString<N>>, Box<dyn Error + Send + Sync>> {
    let value: Option<String> = row.try_get(column)?;
    match value {
        Some(value) => Ok(Some(HeaplessString::try_from(value.as_str()).map_err(
            |_| -> Box<dyn Error + Send + Sync> {
                format!("column {column} exceeds {N} characters").into()
            },
        )?)),
        None => Ok(None),
    }
}
