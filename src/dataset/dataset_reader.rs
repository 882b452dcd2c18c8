use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use super::dataset_struct::Dataset;
use super::feature::Feature;
use crate::error::{ForestError, Result};


/// Column type tags in the second row of a dataset file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Response,
    Numeric,
    Ignore,
}


impl Tag {
    fn parse(tag: &str) -> Result<Self> {
        match tag.trim().to_lowercase().as_str() {
            "r" => Ok(Self::Response),
            "n" => Ok(Self::Numeric),
            "x" => Ok(Self::Ignore),
            _ => Err(ForestError::UnknownTypeTag(tag.trim().to_string())),
        }
    }
}


/// Optional rescaling of the covariates after reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scaling {
    /// Keep the values as read.
    #[default]
    None,
    /// Map each feature into `[0, 1]`.
    MinMax,
    /// Zero mean, unit (population) variance.
    Standard,
}


impl Dataset {
    /// Read a tab-separated dataset.
    ///
    /// The first row holds the column names, the second row holds one type
    /// tag per column (`r` response, `n` numeric covariate, `x` ignored),
    /// and every following non-blank row holds one observation.
    pub fn from_reader<R: Read>(reader: BufReader<R>) -> Result<Self> {
        let mut lines = reader.lines();

        let names = match lines.next() {
            Some(line) => split_row(&line?),
            None => return Err(ForestError::EmptyDataset),
        };
        let tags = match lines.next() {
            Some(line) => split_row(&line?),
            None => return Err(ForestError::MissingResponse),
        };
        if tags.len() != names.len() {
            return Err(ForestError::LengthMismatch {
                name: "type tags".into(),
                expected: names.len(),
                actual: tags.len(),
            });
        }
        let tags = tags.iter()
            .map(|t| Tag::parse(t))
            .collect::<Result<Vec<_>>>()?;

        let n_response = tags.iter()
            .filter(|&&t| t == Tag::Response)
            .count();
        match n_response {
            0 => return Err(ForestError::MissingResponse),
            1 => {},
            n => return Err(ForestError::MultipleResponses(n)),
        }

        let mut features = names.iter()
            .zip(&tags)
            .filter(|(_, t)| **t == Tag::Numeric)
            .map(|(name, _)| Feature::new(name))
            .collect::<Vec<_>>();
        let mut labels = Vec::new();

        // Header and tag rows occupy lines 1 and 2.
        for (line_no, line) in (3..).zip(lines) {
            let line = line?;
            if line.trim().is_empty() { continue; }

            let row = split_row(&line);
            if row.len() != names.len() {
                return Err(ForestError::LengthMismatch {
                    name: format!("line {line_no}"),
                    expected: names.len(),
                    actual: row.len(),
                });
            }

            let mut k = 0;
            for (j, value) in row.iter().enumerate() {
                match tags[j] {
                    Tag::Response => { labels.push(value.trim().to_string()); },
                    Tag::Numeric => {
                        let x = value.trim()
                            .parse::<f64>()
                            .ok()
                            .filter(|x| x.is_finite())
                            .ok_or_else(|| ForestError::Parse {
                                line: line_no,
                                value: value.trim().to_string(),
                            })?;
                        features[k].append(x);
                        k += 1;
                    },
                    Tag::Ignore => {},
                }
            }
        }

        let dataset = Self::new(features, &labels[..])?;
        if dataset.n_class() < 2 {
            return Err(ForestError::TooFewClasses(dataset.n_class()));
        }
        Ok(dataset)
    }
}


fn split_row(line: &str) -> Vec<String> {
    line.trim_end_matches(['\r', '\n'])
        .split('\t')
        .map(str::to_string)
        .collect()
}


/// A struct that returns [`Dataset`].
/// # Example
/// ```no_run
/// use jyrest::prelude::*;
///
/// let dataset = DatasetReader::new()
///     .file("/path/to/data.tsv")
///     .scaling(Scaling::Standard)
///     .read()
///     .unwrap();
/// ```
pub struct DatasetReader<P> {
    file: Option<P>,
    scaling: Scaling,
}


impl<P> DatasetReader<P> {
    /// Construct a new instance of [`DatasetReader`].
    pub fn new() -> Self {
        Self { file: None, scaling: Scaling::None, }
    }


    /// Set the rescaling applied after reading.
    /// Default is [`Scaling::None`].
    pub fn scaling(mut self, scaling: Scaling) -> Self {
        self.scaling = scaling;
        self
    }
}


impl<P> Default for DatasetReader<P> {
    fn default() -> Self {
        Self::new()
    }
}


impl<P> DatasetReader<P>
    where P: AsRef<Path>
{
    /// Set the file name.
    pub fn file(mut self, file: P) -> Self {
        self.file = Some(file);
        self
    }


    /// Reads the file and returns the [`Dataset`].
    pub fn read(self) -> Result<Dataset> {
        let file = self.file
            .ok_or_else(|| ForestError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "the dataset file is not set",
            )))?;
        let file = File::open(file)?;
        let dataset = Dataset::from_reader(BufReader::new(file))?;

        let dataset = match self.scaling {
            Scaling::None => dataset,
            Scaling::MinMax => dataset.scaled(),
            Scaling::Standard => dataset.standardised(),
        };
        Ok(dataset)
    }
}
