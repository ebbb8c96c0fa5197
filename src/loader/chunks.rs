use std::io::Read;

use csv::{Reader, StringRecord};

/// Reads a CSV as consecutive slices of at most `chunk_size` records, so only one
/// slice is held in memory at a time.
pub struct CsvChunks<R: Read> {
    rdr: Reader<R>,
    chunk_size: usize,
    done: bool,
}

impl<R: Read> CsvChunks<R> {
    pub fn new(rdr: Reader<R>, chunk_size: usize) -> Self {
        Self {
            rdr,
            chunk_size: chunk_size.max(1),
            done: false,
        }
    }

    pub fn headers(&mut self) -> csv::Result<&StringRecord> {
        self.rdr.headers()
    }
}

impl<R: Read> Iterator for CsvChunks<R> {
    type Item = csv::Result<Vec<StringRecord>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut chunk = Vec::with_capacity(self.chunk_size);
        let mut record = StringRecord::new();
        while chunk.len() < self.chunk_size {
            match self.rdr.read_record(&mut record) {
                Ok(true) => chunk.push(record.clone()),
                Ok(false) => {
                    self.done = true;
                    break;
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }

        if chunk.is_empty() {
            None
        } else {
            Some(Ok(chunk))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use csv::ReaderBuilder;

    #[test]
    fn splits_into_bounded_chunks() {
        let data = "id,title\n1,a\n2,b\n3,c\n4,d\n5,e\n";
        let rdr = ReaderBuilder::new().from_reader(data.as_bytes());

        let sizes: Vec<usize> = CsvChunks::new(rdr, 2)
            .map(|chunk| chunk.unwrap().len())
            .collect();

        assert_eq!(sizes, vec![2, 2, 1]);
    }

    #[test]
    fn header_only_file_yields_nothing() {
        let rdr = ReaderBuilder::new().from_reader("id,title\n".as_bytes());
        assert_eq!(CsvChunks::new(rdr, 10).count(), 0);
    }
}
