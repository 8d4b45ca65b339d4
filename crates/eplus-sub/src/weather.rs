//! EnergyPlus weather files (`.epw`)
//!
//! An EPW file is CSV: a handful of header records (`LOCATION`,
//! `DESIGN CONDITIONS`, `DATA PERIODS`, ...) followed by hourly climate
//! records whose first cell is the year.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use indexmap::IndexMap;

use crate::error::{Result, SubError};
use crate::table::Table;

/// Column names of EPW climate records, in file order
pub const WEATHER_COLUMNS: [&str; 35] = [
    "Year",
    "Month",
    "Day",
    "Hour",
    "Minute",
    "Data Source and Uncertainty Flags",
    "Dry Bulb Temperature",
    "Dew Point Temperature",
    "Relative Humidity",
    "Atmospheric Station Pressure",
    "Extraterrestrial Horizontal Radiation",
    "Extraterrestrial Direct Normal Radiation",
    "Horizontal Infrared Radiation Intensity",
    "Global Horizontal Radiation",
    "Direct Normal Radiation",
    "Diffuse Horizontal Radiation",
    "Global Horizontal Illuminance",
    "Direct Normal Illuminance",
    "Diffuse Horizontal Illuminance",
    "Zenith Luminance",
    "Wind Direction",
    "Wind Speed",
    "Total Sky Cover",
    "Opaque Sky Cover (used if Horizontal IR Intensity missing)",
    "Visibility",
    "Ceiling Height",
    "Present Weather Observation",
    "Present Weather Codes",
    "Precipitable Water",
    "Aerosol Optical Depth",
    "Snow Depth",
    "Days Since Last Snowfall",
    "Albedo",
    "Liquid Precipitation Depth",
    "Liquid Precipitation Quantity",
];

/// Parsed weather file: header records plus climate data
#[derive(Debug, Clone, PartialEq)]
pub struct Weather {
    headers: IndexMap<String, Vec<String>>,
    data: Table,
}

impl Default for Weather {
    fn default() -> Self {
        Self::new(IndexMap::new(), Vec::new())
    }
}

impl Weather {
    pub fn new(headers: IndexMap<String, Vec<String>>, rows: Vec<Vec<String>>) -> Self {
        let columns = WEATHER_COLUMNS.iter().map(|c| (*c).to_string()).collect();
        Self {
            headers,
            data: Table::new(columns, rows),
        }
    }

    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| SubError::io(path, e))?;
        Self::from_reader(file)
    }

    /// Header records run until the first record whose first cell is all digits.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut headers: IndexMap<String, Vec<String>> = IndexMap::new();
        let mut rows: Vec<Vec<String>> = Vec::new();

        for record in reader.records() {
            let record = record?;
            let first = record.get(0).unwrap_or("");
            if rows.is_empty() && !is_all_digits(first) {
                let values = record.iter().skip(1).map(str::to_string).collect();
                headers.insert(first.to_string(), values);
            } else {
                rows.push(record.iter().map(str::to_string).collect());
            }
        }

        Ok(Self::new(headers, rows))
    }

    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| SubError::io(path, e))?;
        self.to_writer(file)
    }

    /// Headers first, then climate records; fields are quoted only when needed.
    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_writer(writer);

        for (key, values) in &self.headers {
            let record = std::iter::once(key.as_str()).chain(values.iter().map(String::as_str));
            writer.write_record(record)?;
        }
        for row in self.data.rows() {
            writer.write_record(row)?;
        }
        writer.flush().map_err(csv::Error::from)?;
        Ok(())
    }

    pub fn headers(&self) -> &IndexMap<String, Vec<String>> {
        &self.headers
    }

    pub fn header(&self, key: &str) -> Option<&[String]> {
        self.headers.get(key).map(Vec::as_slice)
    }

    pub fn data(&self) -> &Table {
        &self.data
    }

    /// City name from the `LOCATION` record
    pub fn location(&self) -> Option<&str> {
        self.header("LOCATION")
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn column_f64(&self, name: &str) -> Result<Vec<f64>> {
        self.data.column_f64(name)
    }
}

fn is_all_digits(cell: &str) -> bool {
    !cell.is_empty() && cell.bytes().all(|b| b.is_ascii_digit())
}
