/// Shared data structures for gridded input and output datasets
use indexmap::IndexMap;
use ndarray::Array1;

/// Global and variable attributes, kept in file order
pub type Attributes = IndexMap<String, AttributeValue>;

/// Supported attribute value types
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    String(String),
    Int(i32),
    Float(f32),
    Double(f64),
    IntArray(Vec<i32>),
    FloatArray(Vec<f32>),
    DoubleArray(Vec<f64>),
}

impl AttributeValue {
    /// Borrow the value as text, if it is a string attribute
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Convert an attribute read from a NetCDF file.
    ///
    /// Returns `None` for value kinds that have no counterpart here
    /// (unsigned bytes, 64-bit integers, string arrays).
    pub fn from_netcdf(value: netcdf::AttributeValue) -> Option<Self> {
        use netcdf::AttributeValue as Nc;
        match value {
            Nc::Str(s) => Some(AttributeValue::String(s)),
            Nc::Schar(x) => Some(AttributeValue::Int(i32::from(x))),
            Nc::Short(x) => Some(AttributeValue::Int(i32::from(x))),
            Nc::Int(x) => Some(AttributeValue::Int(x)),
            Nc::Float(x) => Some(AttributeValue::Float(x)),
            Nc::Double(x) => Some(AttributeValue::Double(x)),
            Nc::Shorts(xs) => Some(AttributeValue::IntArray(
                xs.into_iter().map(i32::from).collect(),
            )),
            Nc::Ints(xs) => Some(AttributeValue::IntArray(xs)),
            Nc::Floats(xs) => Some(AttributeValue::FloatArray(xs)),
            Nc::Doubles(xs) => Some(AttributeValue::DoubleArray(xs)),
            _ => None,
        }
    }
}

impl From<&AttributeValue> for netcdf::AttributeValue {
    fn from(value: &AttributeValue) -> Self {
        match value {
            AttributeValue::String(s) => netcdf::AttributeValue::Str(s.clone()),
            AttributeValue::Int(x) => netcdf::AttributeValue::Int(*x),
            AttributeValue::Float(x) => netcdf::AttributeValue::Float(*x),
            AttributeValue::Double(x) => netcdf::AttributeValue::Double(*x),
            AttributeValue::IntArray(xs) => netcdf::AttributeValue::Ints(xs.clone()),
            AttributeValue::FloatArray(xs) => netcdf::AttributeValue::Floats(xs.clone()),
            AttributeValue::DoubleArray(xs) => netcdf::AttributeValue::Doubles(xs.clone()),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::String(value.to_string())
    }
}

/// A one-dimensional coordinate variable with its attributes
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateVariable {
    /// Name of the coordinate (and of its dimension)
    pub name: String,
    /// Coordinate values
    pub values: Array1<f64>,
    /// Variable attributes (`units`, `long_name`, ...)
    pub attributes: Attributes,
}

impl CoordinateVariable {
    /// Create a coordinate with no attributes
    pub fn new(name: impl Into<String>, values: Array1<f64>) -> Self {
        Self {
            name: name.into(),
            values,
            attributes: Attributes::new(),
        }
    }

    /// Create a coordinate carrying `long_name` and `units`
    pub fn described(
        name: impl Into<String>,
        values: Array1<f64>,
        long_name: &str,
        units: &str,
    ) -> Self {
        let mut coord = Self::new(name, values);
        coord.attributes.insert("long_name".to_string(), long_name.into());
        coord.attributes.insert("units".to_string(), units.into());
        coord
    }

    /// Same values and attributes under a different name
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: self.values.clone(),
            attributes: self.attributes.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The `units` attribute, if present as text
    pub fn units(&self) -> Option<&str> {
        self.attributes.get("units").and_then(AttributeValue::as_str)
    }
}
