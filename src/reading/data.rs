use serde::Serialize;

/// One output row: `DD/MM/YY,HH:MM:SS,<value>`.
#[derive(Serialize, Debug, PartialEq, Eq)]
pub struct ReadingRecord {
    pub date: String,  // DD/MM/YY, local time
    pub time: String,  // HH:MM:SS, local time
    pub value: String, // as reported by the MW100
}
