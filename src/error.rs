use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO Error {0}")]
    IO(#[from] std::io::Error),
    #[error("End of data [needed={needed} bits, remaining={remaining} bits]")]
    EndOfData { needed: u32, remaining: usize },
    #[error("Corrupt series {0}")]
    Corrupt(String),
}

impl Error {
    ///
    /// True when the bit stream ran dry, either exactly at the end or mid field.
    pub fn is_end_of_data(&self) -> bool {
        matches!(self, Error::EndOfData { .. })
    }
}
