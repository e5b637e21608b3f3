use chrono::{DateTime, TimeZone, Utc};
use labeler::{
    labeled, labels, marshal, marshal_with_options, text_value, unmarshal, unmarshal_with_options,
    Error, GenericallyLabeled, Labeled, Labelee, Labeler, Labels, Options, Reflect, Shape,
    StrictLabelee, Token,
};
use num_complex::Complex;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Default, Clone, Copy, PartialEq)]
enum Flavor {
    #[default]
    Unknown,
    Vanilla,
    Chocolate,
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Flavor::Unknown => "Unknown",
            Flavor::Vanilla => "Vanilla",
            Flavor::Chocolate => "Chocolate",
        };
        f.write_str(name)
    }
}

impl FromStr for Flavor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Unknown" => Ok(Flavor::Unknown),
            "Vanilla" => Ok(Flavor::Vanilla),
            "Chocolate" => Ok(Flavor::Chocolate),
            other => Err(format!("no flavor named {other}")),
        }
    }
}

text_value!(Flavor);

/// Wraps a map and exposes it through a label getter.
struct Source {
    labels: Labels,
}

impl Labeled for Source {
    fn labels(&self) -> Labels {
        self.labels.clone()
    }
}

impl Reflect for Source {
    fn shape() -> Shape {
        Shape::builder::<Self>().labeled().build()
    }
}

fn source(pairs: &[(&str, &str)]) -> Source {
    Source {
        labels: pairs.iter().copied().collect(),
    }
}

labeled! {
    @capabilities(labelee, labeled)
    #[derive(Debug, Default)]
    pub struct Example {
        #[label = "name"]
        pub name: String,
        #[label = "flavor"]
        pub flavor: Flavor,
        #[label = "duration"]
        pub duration: Duration,
        #[label = "time,format:%m/%d/%Y %I:%M%p"]
        pub time: DateTime<Utc>,
        #[label = "time2,timeformat:%m/%d/%Y %I:%M%p"]
        pub time2: DateTime<Utc>,
        #[label = "dedupe,discard"]
        pub dedupe: String,
        #[label = "withdefault,default:defaultvalue"]
        pub with_default: String,
        #[label = "CaSe,casesensitive"]
        pub case: String,
        #[label = "floatWithFormat,format:b"]
        pub float_with_format: f64,
        #[label = "floatWithFormat2,floatformat:b"]
        pub float_with_format2: f64,
        #[label = "complex128"]
        pub complex128: Complex<f64>,
        #[label = "complex64"]
        pub complex64: Complex<f32>,
        #[label = "complexWithFormat,format:b"]
        pub complex_with_format: Complex<f32>,
        #[label = "complexWithFormat2,complexformat:b"]
        pub complex_with_format2: Complex<f32>,
        #[label = "float64"]
        pub float64: f64,
        #[label = "float32"]
        pub float32: f32,
        #[label = "int"]
        pub int: i64,
        #[label = "intbinary,base:2"]
        pub int_binary: i64,
        #[label = "int32"]
        pub int32: i32,
        #[label = "int16"]
        pub int16: i16,
        #[label = "int8"]
        pub int8: i8,
        #[label = "bool"]
        pub flag: bool,
        #[label = "uint"]
        pub uint: usize,
        #[label = "uint64"]
        pub uint64: u64,
        #[label = "uint32"]
        pub uint32: u32,
        #[label = "uint16"]
        pub uint16: u16,
        #[label = "uint8"]
        pub uint8: u8,
        pub labels: Labels,
    }
}

impl Labelee for Example {
    fn set_labels(&mut self, labels: Labels) {
        self.labels = labels;
    }
}

impl Labeled for Example {
    fn labels(&self) -> Labels {
        self.labels.clone()
    }
}

fn evening() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 9, 26, 22, 10, 0).unwrap()
}

#[test]
fn test_unmarshal_example() {
    let input = source(&[
        ("name", "Archer"),
        ("flavor", "Chocolate"),
        ("int", "123456789"),
        ("int32", "12345"),
        ("int16", "123"),
        ("int8", "1"),
        ("intbinary", "111"),
        ("bool", "true"),
        ("duration", "1s"),
        ("float64", "1.1234567890"),
        ("float32", "1.123"),
        ("complex64", "3+4i"),
        ("complex128", "(3+4i)"),
        ("time", "09/26/2020 10:10PM"),
        ("time2", "09/26/2020 10:10PM"),
        ("uint", "1234"),
        ("uint64", "1234567890"),
        ("uint32", "1234567"),
        ("uint16", "123"),
        ("uint8", "1"),
        ("floatWithFormat", "123.234823484"),
        ("floatWithFormat2", "123.234823484"),
        ("complexWithFormat", "123.234823484"),
        ("complexWithFormat2", "123.234823484"),
        ("dedupe", "removed from the labels once the field is set"),
        ("case", "not set, the key does not match case"),
    ]);

    let mut example = Example::default();
    unmarshal(&input, &mut example).unwrap();

    assert_eq!(example.name, "Archer");
    assert_eq!(example.flavor, Flavor::Chocolate);
    assert!(example.flag);
    assert_eq!(example.int, 123_456_789);
    assert_eq!(example.int8, 1);
    assert_eq!(example.int_binary, 7);
    assert_eq!(example.int16, 123);
    assert_eq!(example.int32, 12345);
    assert_eq!(example.float64, 1.123456789);
    assert_eq!(example.float32, 1.123);
    assert_eq!(example.complex64, Complex::new(3.0, 4.0));
    assert_eq!(example.complex128, Complex::new(3.0, 4.0));
    assert_eq!(example.complex_with_format, Complex::new(123.234823484, 0.0));
    assert_eq!(example.duration, Duration::from_secs(1));
    assert_eq!(example.uint, 1234);
    assert_eq!(example.uint64, 1_234_567_890);
    assert_eq!(example.uint32, 1_234_567);
    assert_eq!(example.uint16, 123);
    assert_eq!(example.uint8, 1);
    assert_eq!(example.with_default, "defaultvalue");
    assert!(example.case.is_empty());
    assert_eq!(example.dedupe, "removed from the labels once the field is set");
    assert!(!example.labels.contains_key("dedupe"));
    assert!(example.labels.contains_key("name"));
    assert_eq!(example.time, evening());
    assert_eq!(example.time2, evening());
}

#[test]
fn test_marshal_example() {
    let example = Example {
        name: "Archer".to_string(),
        flag: true,
        duration: Duration::from_secs(1),
        flavor: Flavor::Chocolate,
        complex128: Complex::new(3.0, 4.0),
        complex64: Complex::new(3.0, 4.0),
        float32: 1.123,
        float64: 1.123456789,
        time: evening(),
        time2: evening(),
        int_binary: 7,
        int: 123_456_789,
        int32: 12345,
        int16: 123,
        int8: 1,
        uint8: 1,
        uint16: 123,
        uint32: 12345,
        uint64: 1_234_567_890,
        uint: 1234,
        float_with_format: 123.234823484,
        float_with_format2: 123.234823484,
        complex_with_format: Complex::new(123.234823484, 0.0),
        complex_with_format2: Complex::new(123.234823484, 0.0),
        ..Example::default()
    };

    let expected = [
        ("name", "Archer"),
        ("flavor", "Chocolate"),
        ("int", "123456789"),
        ("int32", "12345"),
        ("int16", "123"),
        ("int8", "1"),
        ("intbinary", "111"),
        ("bool", "true"),
        ("duration", "1s"),
        ("float64", "1.123456789"),
        ("float32", "1.123"),
        ("complex64", "(3+4i)"),
        ("complex128", "(3+4i)"),
        ("time", "09/26/2020 10:10PM"),
        ("time2", "09/26/2020 10:10PM"),
        ("uint", "1234"),
        ("uint64", "1234567890"),
        ("uint32", "12345"),
        ("uint16", "123"),
        ("uint8", "1"),
        ("floatWithFormat", "8671879767525176p-46"),
        ("floatWithFormat2", "8671879767525176p-46"),
        ("complexWithFormat", "(16152635p-17+0p-149i)"),
        ("complexWithFormat2", "(16152635p-17+0p-149i)"),
        ("withdefault", "defaultvalue"),
    ];

    let out = marshal(&example).unwrap();
    for (key, value) in expected {
        assert_eq!(out.get(key), Some(value), "label {key}");
    }
}

#[test]
fn test_input_as_map() {
    let mut input = HashMap::new();
    input.insert("name".to_string(), "Archer".to_string());
    input.insert("flavor".to_string(), "Vanilla".to_string());
    input.insert("imp".to_string(), "important field".to_string());

    let mut example = Example::default();
    unmarshal(&input, &mut example).unwrap();
    assert_eq!(example.name, "Archer");
    assert_eq!(example.flavor, Flavor::Vanilla);
    assert_eq!(example.labels.get("imp"), Some("important field"));
}

labeled! {
    #[derive(Debug, Default)]
    pub struct WithFlavor {
        #[label = "flavor"]
        pub flavor: Flavor,
        #[label = "*"]
        pub labels: HashMap<String, String>,
    }
}

#[test]
fn test_text_value_with_container() {
    let mut value = WithFlavor::default();
    unmarshal(&source(&[("flavor", "Vanilla")]), &mut value).unwrap();
    assert_eq!(value.flavor, Flavor::Vanilla);
    assert_eq!(value.labels.get("flavor").map(String::as_str), Some("Vanilla"));

    let err = unmarshal(&source(&[("flavor", "Mint")]), &mut value).unwrap_err();
    let Error::Parsing(parsing) = err else {
        panic!("expected a parsing error, got {err:?}");
    };
    let field = parsing.field("flavor").unwrap();
    assert_eq!(field.key, "flavor");
    assert!(matches!(field.cause(), Error::Conversion { .. }));
}

labeled! {
    #[derive(Debug, Default)]
    pub struct HiddenContainer {
        #[label = "name"]
        pub name: String,
        #[label = "*"]
        labels: HashMap<String, String>,
    }
}

#[test]
fn test_unexported_container() {
    let mut value = HiddenContainer::default();
    let err = unmarshal(&Labels::new(), &mut value).unwrap_err();
    let Error::Parsing(parsing) = err else {
        panic!("expected a parsing error, got {err:?}");
    };
    assert_eq!(parsing.errors.len(), 1);
    assert_eq!(parsing.errors[0].path, "labels");
    assert!(matches!(parsing.errors[0].cause(), Error::UnexportedField));
    assert!(value.labels.is_empty());
}

labeled! {
    @capabilities(labelee)
    #[derive(Debug, Default)]
    pub struct WithDiscard {
        #[label = "will_not_be_in_labels,discard"]
        pub discarded: String,
        #[label = "will_be_in_labels"]
        pub kept: String,
        pub labels: Labels,
    }
}

impl Labelee for WithDiscard {
    fn set_labels(&mut self, labels: Labels) {
        self.labels = labels;
    }
}

#[test]
fn test_labelee_with_discard() {
    let input = source(&[
        ("will_not_be_in_labels", "discarded_value"),
        ("will_be_in_labels", "kept_value"),
        ("unassigned", "unassigned will be in labels"),
    ]);
    let mut value = WithDiscard::default();
    unmarshal(&input, &mut value).unwrap();

    assert_eq!(value.discarded, "discarded_value");
    assert_eq!(value.kept, "kept_value");
    assert!(!value.labels.contains_key("will_not_be_in_labels"));
    assert!(value.labels.contains_key("will_be_in_labels"));
    assert!(value.labels.contains_key("unassigned"));
}

labeled! {
    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct Nested {
        #[label = "subfield"]
        pub sub_field: String,
    }
}

labeled! {
    #[derive(Debug, Default)]
    pub struct WithNested {
        pub nested: Nested,
        #[label = "parentfield"]
        pub parent_field: String,
        #[label = "*"]
        pub labels: HashMap<String, String>,
    }
}

#[test]
fn test_nested_struct() {
    let input = source(&[("parentfield", "parent-value"), ("subfield", "sub-value")]);
    let mut value = WithNested::default();
    unmarshal(&input, &mut value).unwrap();
    assert_eq!(value.nested.sub_field, "sub-value");
    assert_eq!(value.parent_field, "parent-value");

    let out = marshal(&value).unwrap();
    assert_eq!(out.get("subfield"), Some("sub-value"));
}

labeled! {
    @capabilities(labelee)
    #[derive(Debug, Default)]
    pub struct WithNestedAsOption {
        pub nested: Option<Nested>,
        pub boxed: Box<Nested>,
    }
}

impl Labelee for WithNestedAsOption {
    fn set_labels(&mut self, _: Labels) {}
}

#[test]
fn test_nested_struct_behind_pointers() {
    let input = source(&[("parentfield", "parent-value"), ("subfield", "sub-value")]);
    let mut value = WithNestedAsOption::default();
    unmarshal(&input, &mut value).unwrap();
    assert_eq!(value.nested.as_ref().map(|n| n.sub_field.as_str()), Some("sub-value"));
    assert_eq!(value.boxed.sub_field, "sub-value");

    // nothing to write means nothing to allocate
    let mut value = WithNestedAsOption::default();
    unmarshal(&Labels::new(), &mut value).unwrap();
    assert!(value.nested.is_none());
}

labeled! {
    #[derive(Debug, Default)]
    pub struct NumberBases {
        #[label = "*"]
        pub labels: HashMap<String, String>,
        #[label = "binaryint1,base:2"]
        pub binary_int1: i64,
        #[label = "binaryint2,intbase:2"]
        pub binary_int2: i64,
        #[label = "binaryuint1,base:2"]
        pub binary_uint1: u64,
        #[label = "binaryuint2,uintbase:2"]
        pub binary_uint2: u64,
        #[label = "hex,base:0"]
        pub hex: u32,
    }
}

#[test]
fn test_number_bases() {
    let input = source(&[
        ("binaryInt1", "111"),
        ("binaryInt2", "11"),
        ("binaryUint1", "111"),
        ("binaryUint2", "11"),
        ("hex", "0xff"),
    ]);
    let mut value = NumberBases::default();
    unmarshal(&input, &mut value).unwrap();
    assert_eq!(value.binary_int1, 7);
    assert_eq!(value.binary_int2, 3);
    assert_eq!(value.binary_uint1, 7);
    assert_eq!(value.binary_uint2, 3);
    assert_eq!(value.hex, 255);
}

labeled! {
    #[derive(Debug, Default)]
    pub struct SliceWithDefault {
        #[label = "strings,default:1|2|3,split:|"]
        pub slice: Vec<i32>,
        #[label = "*"]
        pub labels: HashMap<String, String>,
    }
}

#[test]
fn test_slice_with_default() {
    let mut value = SliceWithDefault::default();
    unmarshal(&Labels::new(), &mut value).unwrap();
    assert_eq!(value.slice, vec![1, 2, 3]);
}

labeled! {
    #[derive(Debug, Default)]
    pub struct Slices {
        #[label = "strings"]
        pub strings: Vec<String>,
        #[label = "ints"]
        pub ints: Vec<i64>,
        ex: String,
        #[label = "*"]
        pub labels: HashMap<String, String>,
    }
}

#[test]
fn test_unmarshal_slice() {
    let mut input = HashMap::new();
    input.insert("strings".to_string(), "zero,one,two,three,four".to_string());
    input.insert("ints".to_string(), "0,1,2,3,4,2000".to_string());

    let mut value = Slices::default();
    unmarshal(&input, &mut value).unwrap();
    assert_eq!(value.strings, vec!["zero", "one", "two", "three", "four"]);
    assert_eq!(value.ints, vec![0, 1, 2, 3, 4, 2000]);
    assert!(value.ex.is_empty());
}

#[test]
fn test_marshal_slice() {
    let value = Slices {
        strings: vec!["zero".into(), "one".into(), "two".into()],
        ints: vec![0, 1, 2000],
        ..Slices::default()
    };
    let out = marshal(&value).unwrap();
    assert_eq!(out.get("strings"), Some("zero,one,two"));
    assert_eq!(out.get("ints"), Some("0,1,2000"));
}

labeled! {
    #[derive(Debug, Default)]
    pub struct Arrays {
        #[label = "strings"]
        pub strings: [String; 5],
        #[label = "floats"]
        pub floats: [f32; 6],
        #[label = "*"]
        pub labels: HashMap<String, String>,
    }
}

#[test]
fn test_unmarshal_array() {
    let mut input = BTreeMap::new();
    input.insert("Strings".to_string(), "zero,one,two,three,four".to_string());
    input.insert("floats".to_string(), "0.1,1.2,2.3,3.4,4.5,2000.0123".to_string());

    let mut value = Arrays::default();
    unmarshal(&input, &mut value).unwrap();
    assert_eq!(value.strings, ["zero", "one", "two", "three", "four"].map(String::from));
    assert_eq!(value.floats, [0.1, 1.2, 2.3, 3.4, 4.5, 2000.0123]);

    input.insert("floats".to_string(), "1,2,3,4,5,6,7".to_string());
    let err = unmarshal(&input, &mut value).unwrap_err();
    let Error::Parsing(parsing) = err else {
        panic!("expected a parsing error, got {err:?}");
    };
    assert!(parsing.field("floats").is_some());
}

#[test]
fn test_marshal_array() {
    let value = Arrays {
        strings: ["zero", "one", "two", "three", "four"].map(String::from),
        floats: [0.1, 1.2, 2.3, 3.4, 4.5, 2000.0123],
        labels: HashMap::new(),
    };
    let out = marshal(&value).unwrap();
    assert_eq!(out.get("strings"), Some("zero,one,two,three,four"));
    assert_eq!(out.get("floats"), Some("0.1,1.2,2.3,3.4,4.5,2000.0123"));
}

#[test]
fn test_option_validation() {
    assert!(Labeler::new().validate_options().is_ok());

    let broken = [
        Options::new().with_tag(""),
        Options::new().with_container_token(""),
        Options::new().with_separator(""),
        Options::new().with_assignment(""),
        Options::new().with_token(Token::Base, ""),
        Options::new().with_token(Token::IntBase, ""),
        Options::new().with_token(Token::UintBase, ""),
        Options::new().with_token(Token::Default, ""),
        Options::new().with_token(Token::Discard, ""),
        Options::new().with_token(Token::FloatFormat, ""),
        Options::new().with_token(Token::Format, ""),
        Options::new().with_token(Token::ComplexFormat, ""),
        Options::new().with_token(Token::IgnoreCase, ""),
        Options::new().with_token(Token::TimeFormat, ""),
        Options::new().with_token(Token::CaseSensitive, ""),
    ];
    for options in broken {
        assert!(Labeler::with_options(options.clone()).is_err(), "{options:?}");
    }

    let err = Labeler::with_options(Options::new().with_float_format('q')).unwrap_err();
    assert!(matches!(err, Error::InvalidFloatFormat(_)));
}

labeled! {
    #[derive(Debug, Default)]
    pub struct PrivateParts {
        #[label = "*"]
        pub labels: HashMap<String, String>,
        private: Nested,
        #[label = "public"]
        pub public: String,
    }
}

#[test]
fn test_ignore_unexported_fields() {
    let input = labels! { "public" => "value", "subfield" => "not for private" };
    let mut value = PrivateParts::default();
    unmarshal(&input, &mut value).unwrap();
    assert_eq!(value.public, "value");
    assert!(value.private.sub_field.is_empty());
}

labeled! {
    #[derive(Debug, Default)]
    pub struct TwoContainers {
        #[label = "*"]
        pub first: HashMap<String, String>,
        #[label = "*"]
        pub second: Labels,
    }
}

#[test]
fn test_multiple_containers() {
    let mut value = TwoContainers::default();
    let err = unmarshal(&Labels::new(), &mut value).unwrap_err();
    assert!(matches!(err, Error::MultipleContainers { .. }));

    let err = marshal(&value).unwrap_err();
    assert!(matches!(err, Error::MultipleContainers { .. }));
}

labeled! {
    #[derive(Debug, Default)]
    pub struct NoContainer {
        #[label = "name"]
        pub name: String,
    }
}

#[test]
fn test_missing_container() {
    let mut value = NoContainer::default();
    let err = unmarshal(&labels! { "name" => "x" }, &mut value).unwrap_err();
    assert!(matches!(err, Error::MissingContainer(_)));

    // marshal does not need one
    value.name = "x".to_string();
    assert_eq!(marshal(&value).unwrap().get("name"), Some("x"));
}

#[test]
fn test_container_by_option() {
    labeled! {
        #[derive(Debug, Default)]
        pub struct Untagged {
            #[label = "name"]
            pub name: String,
            pub extra: BTreeMap<String, String>,
        }
    }

    let options = Options::new().with_container_field("extra");
    let mut value = Untagged::default();
    unmarshal_with_options(&labels! { "name" => "a", "zone" => "b" }, &mut value, options).unwrap();
    assert_eq!(value.name, "a");
    assert_eq!(value.extra.get("zone").map(String::as_str), Some("b"));
}

labeled! {
    #[derive(Debug, Default)]
    pub struct Strict {
        #[label = "name"]
        pub name: String,
        #[label = "optional,notrequired"]
        pub optional: String,
        #[label = "*"]
        pub labels: Labels,
    }
}

#[test]
fn test_require_all() {
    let options = Options::new().require_all();
    let mut value = Strict::default();
    let err = unmarshal_with_options(&Labels::new(), &mut value, options).unwrap_err();
    let Error::Parsing(parsing) = err else {
        panic!("expected a parsing error, got {err:?}");
    };
    assert_eq!(parsing.errors.len(), 1);
    assert_eq!(parsing.errors[0].path, "name");
    assert!(matches!(parsing.errors[0].cause(), Error::MissingRequiredLabel));
}

#[test]
fn test_global_policies() {
    let options = Options::new().case_sensitive().discard_labels().with_default("none");
    let mut value = Strict::default();
    unmarshal_with_options(
        &labels! { "NAME" => "upper", "name" => "lower", "other" => "x" },
        &mut value,
        options,
    )
    .unwrap();
    assert_eq!(value.name, "lower");
    assert_eq!(value.optional, "none");
    assert!(!value.labels.contains_key("name"));
    assert!(value.labels.contains_key("NAME"));
    assert!(value.labels.contains_key("other"));
}

labeled! {
    #[derive(Debug, Default)]
    pub struct OverriddenByContainer {
        #[label = "count"]
        pub count: u32,
        #[label = "ratio"]
        pub ratio: f64,
        #[label = "*,discard,intbase:16,uintbase:16,floatformat:e"]
        pub labels: Labels,
    }
}

#[test]
fn test_container_tag_overrides_options() {
    let mut value = OverriddenByContainer::default();
    unmarshal(&labels! { "count" => "ff", "ratio" => "0.5", "x" => "y" }, &mut value).unwrap();
    assert_eq!(value.count, 255);
    assert_eq!(value.labels.len(), 1);

    let out = marshal(&value).unwrap();
    assert_eq!(out.get("count"), Some("ff"));
    assert_eq!(out.get("ratio"), Some("5e-01"));
    assert_eq!(out.get("x"), Some("y"));
}

labeled! {
    #[derive(Debug, Default)]
    pub struct Sparse {
        #[label = "empty,omitempty"]
        pub empty: String,
        #[label = "fallback,default:unset"]
        pub fallback: String,
        #[label = "present"]
        pub present: String,
        #[label = "ports"]
        pub ports: Option<Vec<u16>>,
    }
}

#[test]
fn test_marshal_empty_values() {
    let out = marshal(&Sparse::default()).unwrap();
    assert!(out.get("empty").is_none());
    assert_eq!(out.get("fallback"), Some("unset"));
    assert_eq!(out.get("present"), Some(""));
    assert_eq!(out.get("ports"), Some(""));

    // omitempty wins over a default
    let out = marshal_with_options(&Sparse::default(), Options::new().omit_empty()).unwrap();
    assert!(out.is_empty());

    let value = Sparse {
        ports: Some(vec![80, 443]),
        ..Sparse::default()
    };
    assert_eq!(marshal(&value).unwrap().get("ports"), Some("80,443"));
}

/// A container that refuses labels with empty values.
#[derive(Debug, Default)]
pub struct Checked(Labels);

impl StrictLabelee for Checked {
    fn try_set_labels(&mut self, labels: Labels) -> labeler::Result<()> {
        if let Some((key, _)) = labels.iter().find(|(_, value)| value.is_empty()) {
            return Err(Error::custom(format!("label {key} is empty")));
        }
        self.0 = labels;
        Ok(())
    }
}

impl GenericallyLabeled for Checked {
    fn labels_for(&self, tag: &str) -> Labels {
        self.0
            .iter()
            .map(|(key, value)| (format!("{tag}/{key}"), value.clone()))
            .collect()
    }
}

impl Reflect for Checked {
    fn shape() -> Shape {
        Shape::builder::<Self>()
            .strict_labelee()
            .generically_labeled()
            .build()
    }
}

labeled! {
    #[derive(Debug, Default)]
    pub struct WithChecked {
        #[label = "name"]
        pub name: String,
        #[label = "*"]
        pub rest: Checked,
    }
}

#[test]
fn test_capability_container() {
    let mut value = WithChecked::default();
    unmarshal(&labels! { "name" => "n", "a" => "1" }, &mut value).unwrap();
    assert_eq!(value.rest.0.get("a"), Some("1"));

    let out = marshal(&value).unwrap();
    assert_eq!(out.get("label/a"), Some("1"));
    assert_eq!(out.get("name"), Some("n"));

    let err = unmarshal(&labels! { "name" => "n", "a" => "" }, &mut value).unwrap_err();
    let Error::Parsing(parsing) = err else {
        panic!("expected a parsing error, got {err:?}");
    };
    assert_eq!(parsing.errors[0].path, "rest");
}

#[test]
fn test_invalid_input() {
    let mut value = Strict::default();
    let err = unmarshal(&"name=x".to_string(), &mut value).unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
}

labeled! {
    #[derive(Debug, Default)]
    pub struct Unsupported {
        #[label = "nested"]
        pub nested: Vec<Vec<u8>>,
        #[label = "bad,base:1"]
        pub bad: u8,
        #[label = "*"]
        pub rest: Labels,
    }
}

#[test]
fn test_all_field_errors_are_reported() {
    let mut value = Unsupported::default();
    let err = unmarshal(&Labels::new(), &mut value).unwrap_err();
    let Error::Parsing(parsing) = err else {
        panic!("expected a parsing error, got {err:?}");
    };
    assert_eq!(parsing.errors.len(), 2);
    assert!(matches!(parsing.errors[0].cause(), Error::UnsupportedType(_)));
    assert!(matches!(parsing.errors[1].cause(), Error::MalformedTag { .. }));
    assert_eq!(
        parsing.to_string(),
        "2 error(s) occurred while parsing (nested, bad)"
    );
}

/// Reads and writes its labels under a prefix.
#[derive(Debug, Default, PartialEq)]
pub struct Prefixed {
    pub prefix: String,
    pub values: Labels,
}

impl labeler::MarshalLabelsWithOptions for Prefixed {
    fn marshal_labels_with(&self, options: &Options) -> labeler::Result<Labels> {
        Ok(self
            .values
            .iter()
            .map(|(key, value)| (format!("{}{}{}", self.prefix, options.separator, key), value.clone()))
            .collect())
    }
}

impl labeler::UnmarshalLabels for Prefixed {
    fn unmarshal_labels(&mut self, labels: &Labels) -> labeler::Result<()> {
        self.values = labels
            .iter()
            .filter_map(|(key, value)| {
                key.strip_prefix("ann.")
                    .map(|rest| (rest.to_string(), value.clone()))
            })
            .collect();
        Ok(())
    }
}

impl Reflect for Prefixed {
    fn shape() -> Shape {
        Shape::builder::<Self>()
            .marshal_labels_with_options()
            .unmarshal_labels()
            .build()
    }
}

#[test]
fn test_self_marshaling_value() {
    let mut value = Prefixed::default();
    unmarshal(&labels! { "ann.owner" => "ops", "other" => "x" }, &mut value).unwrap();
    assert_eq!(value.values, labels! { "owner" => "ops" });

    value.prefix = "ann".to_string();
    let out = marshal(&value).unwrap();
    assert_eq!(out, labels! { "ann,owner" => "ops" });
}

labeled! {
    #[derive(Debug, Default)]
    pub struct WithAnnotations {
        #[label = "name"]
        pub name: String,
        #[label = "annotations"]
        pub annotations: Prefixed,
        #[label = "*,discard"]
        pub rest: Labels,
    }
}

#[test]
fn test_self_unmarshaling_field_sees_every_label() {
    let mut value = WithAnnotations::default();
    unmarshal(
        &labels! { "name" => "api", "ann.team" => "core", "zone" => "eu" },
        &mut value,
    )
    .unwrap();
    assert_eq!(value.name, "api");
    assert_eq!(value.annotations.values.get("team"), Some("core"));
    // a self-unmarshaling field consumes no key
    assert!(value.rest.contains_key("ann.team"));
    assert!(!value.rest.contains_key("name"));
}

/// Stores labels per tag name.
#[derive(Debug, Default)]
pub struct PerTag {
    pub seen: Vec<(String, Labels)>,
}

impl labeler::GenericLabelee for PerTag {
    fn set_labels_for(&mut self, labels: Labels, tag: &str) -> labeler::Result<()> {
        self.seen.push((tag.to_string(), labels));
        Ok(())
    }
}

impl Reflect for PerTag {
    fn shape() -> Shape {
        Shape::builder::<Self>().generic_labelee().build()
    }
}

labeled! {
    #[derive(Debug, Default)]
    pub struct EnvRecord {
        #[env = "PATH"]
        pub path: String,
        #[env = "*"]
        pub rest: PerTag,
    }
}

#[test]
fn test_generic_labelee_container_gets_tag_name() {
    let mut value = EnvRecord::default();
    let options = Options::new().with_tag("env").discard_labels();
    unmarshal_with_options(&labels! { "PATH" => "/bin", "HOME" => "/root" }, &mut value, options).unwrap();
    assert_eq!(value.path, "/bin");
    assert_eq!(value.rest.seen.len(), 1);
    assert_eq!(value.rest.seen[0].0, "env");
    assert_eq!(value.rest.seen[0].1, labels! { "HOME" => "/root" });
}

labeled! {
    #[derive(Debug, Default, PartialEq)]
    pub struct HexFloats {
        #[label = "ratio,floatformat:x"]
        pub ratio: f64,
        #[label = "scale,floatformat:X"]
        pub scale: f32,
        #[label = "phase,floatformat:x"]
        pub phase: Complex<f64>,
        #[label = "*"]
        pub rest: Labels,
    }
}

#[test]
fn test_hex_float_formats_read_back() {
    let value = HexFloats {
        ratio: 1.5,
        scale: -0.1,
        phase: Complex::new(0.25, -3.0),
        rest: Labels::new(),
    };
    let out = marshal(&value).unwrap();
    assert_eq!(out.get("ratio"), Some("0x1.8p+00"));
    assert_eq!(out.get("phase"), Some("(0x1p-02-0x1.8p+01i)"));

    let mut back = HexFloats::default();
    unmarshal_with_options(&out, &mut back, Options::new().discard_labels()).unwrap();
    assert_eq!(back, value);
}

labeled! {
    #[derive(Debug, Default)]
    pub struct Defaults {
        #[label = "mode,default:fast"]
        pub mode: String,
        #[label = "level"]
        pub level: String,
        #[label = "*"]
        pub rest: Labels,
    }
}

#[test]
fn test_field_default_beats_global_default() {
    let options = Options::new().with_default("none");

    let mut value = Defaults::default();
    unmarshal_with_options(&Labels::new(), &mut value, options.clone()).unwrap();
    assert_eq!(value.mode, "fast");
    assert_eq!(value.level, "none");

    let out = marshal_with_options(&Defaults::default(), options).unwrap();
    assert_eq!(out.get("mode"), Some("fast"));
    assert_eq!(out.get("level"), Some("none"));
}

labeled! {
    #[derive(Debug, Default)]
    pub struct Sealed {
        #[label = "token"]
        token: String,
    }
}

labeled! {
    #[derive(Debug, Default)]
    pub struct Vault {
        pub sealed: Sealed,
    }
}

labeled! {
    #[derive(Debug, Default)]
    pub struct Bank {
        #[label = "name"]
        pub name: String,
        pub vault: Option<Vault>,
        #[label = "*"]
        pub rest: Labels,
    }
}

#[test]
fn test_tagged_private_field_fails_at_any_depth() {
    let mut bank = Bank::default();
    let err = unmarshal(&labels! { "name" => "central", "token" => "x" }, &mut bank).unwrap_err();
    let Error::Parsing(parsing) = err else {
        panic!("expected a parsing error, got {err:?}");
    };
    assert_eq!(parsing.errors.len(), 1);
    assert_eq!(parsing.errors[0].path, "vault.sealed.token");
    assert_eq!(parsing.errors[0].key, "token");
    assert!(matches!(parsing.errors[0].cause(), Error::UnexportedField));
    assert!(bank.vault.is_none());

    let err = marshal(&bank).unwrap_err();
    let Error::Parsing(parsing) = err else {
        panic!("expected a parsing error, got {err:?}");
    };
    assert_eq!(parsing.errors[0].path, "vault.sealed.token");
}

labeled! {
    #[derive(Debug, Default, PartialEq)]
    pub struct Pointers {
        #[label = "ports"]
        pub ports: Vec<Option<u16>>,
        #[label = "names,split:;"]
        pub names: Vec<Box<String>>,
        #[label = "pair"]
        pub pair: [Option<i8>; 2],
        #[label = "*"]
        pub rest: Labels,
    }
}

#[test]
fn test_pointer_elements() {
    let mut value = Pointers::default();
    unmarshal(
        &labels! { "ports" => "80,443", "names" => "a;b", "pair" => "-1" },
        &mut value,
    )
    .unwrap();
    assert_eq!(value.ports, vec![Some(80), Some(443)]);
    assert_eq!(value.names, vec![Box::new("a".to_string()), Box::new("b".to_string())]);
    assert_eq!(value.pair, [Some(-1), None]);

    let out = marshal(&value).unwrap();
    assert_eq!(out.get("ports"), Some("80,443"));
    assert_eq!(out.get("names"), Some("a;b"));
    assert_eq!(out.get("pair"), Some("-1,"));
}
