//! PDF stream object implementation

use std::io::Read;

use log::{trace, warn};

use crate::error::PDFResult;
use super::{Dictionary, Filter, Name, ObjectType};

/// PDF stream object: a dictionary plus its filtered (encoded) payload
#[derive(Debug, Clone, PartialEq)]
pub struct Stream {
    /// Stream dictionary
    dictionary: Dictionary,
    /// Encoded stream data, exactly as written between `stream` and `endstream`
    data: Vec<u8>,
}

impl Stream {
    /// Create a stream from already-encoded data. Filters named in the
    /// dictionary are assumed to have been applied.
    pub fn new(dictionary: Dictionary, data: Vec<u8>) -> Self {
        Self { dictionary, data }
    }

    /// Create a stream from decoded data, applying `filters` in order
    pub fn from_decoded(mut dictionary: Dictionary, decoded: &[u8], filters: &[Filter]) -> PDFResult<Self> {
        let mut data = decoded.to_vec();
        for filter in filters.iter().rev() {
            data = filter.encode(&data)?;
        }
        Self::set_filter_entry(&mut dictionary, filters);
        dictionary.set(Name::LENGTH, data.len());
        Ok(Self { dictionary, data })
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    pub fn dictionary_mut(&mut self) -> &mut Dictionary {
        &mut self.dictionary
    }

    /// Encoded payload
    pub fn raw_data(&self) -> &[u8] {
        &self.data
    }

    /// Reader over the encoded payload, as it appears in the file
    pub fn filtered_stream(&self) -> impl Read + '_ {
        self.data.as_slice()
    }

    /// Filters named by `/Filter`, in decoding order. Unknown names are
    /// skipped with a warning.
    pub fn filters(&self) -> Vec<Filter> {
        let mut filters = Vec::new();

        match self.dictionary.get(Name::FILTER) {
            Some(ObjectType::Name(name)) => match Filter::from_name(name.as_str()) {
                Ok(filter) => filters.push(filter),
                Err(e) => warn!("{}", e),
            },
            Some(ObjectType::Array(array)) => {
                for entry in array {
                    if let ObjectType::Name(name) = entry {
                        match Filter::from_name(name.as_str()) {
                            Ok(filter) => filters.push(filter),
                            Err(e) => warn!("{}", e),
                        }
                    }
                }
            }
            Some(_) => warn!("Invalid filter specification"),
            None => {}
        }

        filters
    }

    /// Decode stream data
    pub fn decode(&self) -> PDFResult<Vec<u8>> {
        let filters = self.filters();
        trace!("Decoding stream with {} filters", filters.len());

        let mut data = self.data.clone();
        for filter in &filters {
            data = filter.decode(&data)?;
        }
        Ok(data)
    }

    /// Replace the payload with `decoded`, re-encoding it with the
    /// stream's current filters
    pub fn set_decoded(&mut self, decoded: &[u8]) -> PDFResult<()> {
        let filters = self.filters();
        trace!("Encoding stream with {} filters", filters.len());

        let mut data = decoded.to_vec();
        for filter in filters.iter().rev() {
            data = filter.encode(&data)?;
        }
        self.data = data;
        self.dictionary.set(Name::LENGTH, self.data.len());
        Ok(())
    }

    /// Apply one more filter on top of the current encoding
    pub fn add_filter(&mut self, filter: Filter) -> PDFResult<()> {
        let mut filters = self.filters();
        self.data = filter.encode(&self.data)?;
        filters.insert(0, filter);

        Self::set_filter_entry(&mut self.dictionary, &filters);
        self.dictionary.set(Name::LENGTH, self.data.len());
        Ok(())
    }

    fn set_filter_entry(dictionary: &mut Dictionary, filters: &[Filter]) {
        match filters {
            [] => {
                dictionary.remove(Name::FILTER);
            }
            [single] => dictionary.set(Name::FILTER, Name::from(single.name())),
            many => dictionary.set(
                Name::FILTER,
                many.iter()
                    .map(|f| ObjectType::Name(Name::from(f.name())))
                    .collect::<Vec<_>>(),
            ),
        }
    }
}
