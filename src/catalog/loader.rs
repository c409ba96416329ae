//! Catalog file loader
//!
//! Reads a spreadsheet (xlsx/xls/ods via calamine) or a delimited text file
//! (csv/tsv) fully into memory and normalizes it into `BookRecord`s.
//! Column presence is settled here, once: any attribute the file does not
//! provide is synthesized as empty so filtering never checks for it again.

use calamine::{open_workbook_auto, Data, Reader};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::record::{BookRecord, Field};
use crate::error::DataSourceError;

/// Workbook extensions handed to calamine
const WORKBOOK_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// A loaded catalog snapshot
#[derive(Debug, Clone)]
pub struct Catalog {
    /// The file this snapshot was read from
    pub path: PathBuf,
    /// Records in source-file order
    pub records: Vec<BookRecord>,
    /// Non-fatal coercions applied while loading
    pub warnings: Vec<FieldCoercionWarning>,
    /// Which attributes came from the file and which were synthesized
    pub columns: ColumnReport,
}

impl Catalog {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// How the header row was mapped onto `BookRecord` attributes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnReport {
    /// Attribute and the source header it was read from (first ISBN column only)
    pub found: Vec<(Field, String)>,
    /// Attributes the file had no column for
    pub synthesized: Vec<Field>,
}

/// A row value that could not be used and was replaced by its default
#[derive(Debug, Clone, PartialEq)]
pub struct FieldCoercionWarning {
    /// 1-based row in the source file (the header is row 1)
    pub row: usize,
    pub field: Field,
    /// The value as found in the file
    pub raw: String,
}

impl fmt::Display for FieldCoercionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let default = match self.field {
            Field::Price => "0",
            _ => "empty",
        };
        write!(
            f,
            "row {}: {} value {:?} is not valid, using {}",
            self.row, self.field, self.raw, default
        )
    }
}

/// One cell as read from the source, before normalization
#[derive(Debug, Clone, PartialEq)]
enum RawCell {
    Empty,
    Number(f64),
    Text(String),
}

impl From<&Data> for RawCell {
    fn from(cell: &Data) -> Self {
        match cell {
            Data::Empty => RawCell::Empty,
            Data::Int(value) => RawCell::Number(*value as f64),
            Data::Float(value) => RawCell::Number(*value),
            Data::String(value) => RawCell::Text(value.clone()),
            other => RawCell::Text(other.to_string()),
        }
    }
}

impl RawCell {
    /// Cell rendered as trimmed text
    ///
    /// Whole numbers lose their fractional part so an ISBN typed into a
    /// spreadsheet as a number comes back as plain digits.
    fn to_text(&self) -> String {
        match self {
            RawCell::Empty => String::new(),
            RawCell::Text(value) => value.trim().to_string(),
            RawCell::Number(value) => {
                if value.fract() == 0.0 && value.abs() < 1e15 {
                    format!("{}", *value as i64)
                } else {
                    value.to_string()
                }
            }
        }
    }

    fn is_blank(&self) -> bool {
        match self {
            RawCell::Empty => true,
            RawCell::Text(value) => value.trim().is_empty(),
            RawCell::Number(_) => false,
        }
    }
}

/// Load a catalog file into memory
///
/// # Errors
/// Returns `DataSourceError` if the file is missing, has an unknown
/// extension, or cannot be parsed. Bad individual values never fail the load.
pub fn load(path: &Path) -> Result<Catalog, DataSourceError> {
    if !path.is_file() {
        return Err(DataSourceError::NotFound(path.to_path_buf()));
    }

    let rows = read_rows(path)?;
    let catalog = normalize(path, rows);

    for (field, header) in &catalog.columns.found {
        debug!("Column {:?} -> {}", header, field);
    }

    info!(
        "📚 Loaded {} books from {} ({} warnings, {} synthesized columns)",
        catalog.records.len(),
        path.display(),
        catalog.warnings.len(),
        catalog.columns.synthesized.len()
    );

    Ok(catalog)
}

/// Read every row of the file, header included
fn read_rows(path: &Path) -> Result<Vec<Vec<RawCell>>, DataSourceError> {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "csv" => read_delimited(path, b','),
        "tsv" => read_delimited(path, b'\t'),
        ext if WORKBOOK_EXTENSIONS.contains(&ext) => read_workbook(path),
        _ => Err(DataSourceError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Read the first worksheet of a workbook
fn read_workbook(path: &Path) -> Result<Vec<Vec<RawCell>>, DataSourceError> {
    let spreadsheet_error = |reason: String| DataSourceError::Spreadsheet {
        path: path.to_path_buf(),
        reason,
    };

    let mut workbook = open_workbook_auto(path).map_err(|e| spreadsheet_error(e.to_string()))?;

    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range.map_err(|e| spreadsheet_error(e.to_string()))?,
        // A workbook without sheets is an empty catalog
        None => return Ok(Vec::new()),
    };

    Ok(range
        .rows()
        .map(|row| row.iter().map(RawCell::from).collect())
        .collect())
}

/// Read a CSV/TSV file; rows may have differing lengths
///
/// Cells that are not valid UTF-8 are read as Latin-1, the usual encoding of
/// spreadsheet exports that are not UTF-8.
fn read_delimited(path: &Path, delimiter: u8) -> Result<Vec<Vec<RawCell>>, DataSourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_path(path)?;

    let mut rows = Vec::new();
    let mut latin1_cells = 0;
    for record in reader.byte_records() {
        let record = record?;
        let row = record
            .iter()
            .map(|bytes| match std::str::from_utf8(bytes) {
                Ok(value) => RawCell::Text(value.to_string()),
                Err(_) => {
                    latin1_cells += 1;
                    RawCell::Text(decode_latin1(bytes))
                }
            })
            .collect();
        rows.push(row);
    }

    if latin1_cells > 0 {
        warn!(
            "{}: {} cells are not valid UTF-8, read as Latin-1",
            path.display(),
            latin1_cells
        );
    }
    Ok(rows)
}

/// Every Latin-1 byte is the Unicode code point of the same value
fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&byte| char::from(byte)).collect()
}

/// Turn raw rows (header first) into a catalog
fn normalize(path: &Path, rows: Vec<Vec<RawCell>>) -> Catalog {
    let mut rows = rows.into_iter();

    let header: Vec<String> = rows
        .next()
        .map(|cells| cells.iter().map(RawCell::to_text).collect())
        .unwrap_or_default();
    let layout = ColumnLayout::from_header(&header);

    let mut warnings = Vec::new();
    let mut records = Vec::new();
    for (index, row) in rows.enumerate() {
        // Spreadsheets often carry fully empty rows between or after data
        if row.iter().all(RawCell::is_blank) {
            continue;
        }
        // +2: 1-based, and the header occupies row 1
        records.push(layout.build(index + 2, &row, &mut warnings));
    }

    for warning in &warnings {
        warn!(row = warning.row, field = %warning.field, raw = %warning.raw, "Field coercion: {}", warning);
    }

    Catalog {
        path: path.to_path_buf(),
        records,
        warnings,
        columns: layout.report(),
    }
}

/// Reduce a header to lowercase ASCII alphanumerics
///
/// "ISBN-13", "isbn 13" and "Isbn13" all become "isbn13".
fn reduce_header(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Map a reduced header to the attribute it names
fn attribute_for(reduced: &str) -> Option<Field> {
    if reduced.starts_with("isbn") {
        return Some(Field::Isbn);
    }
    let field = match reduced {
        "title" | "bookname" | "booktitle" | "name" => Field::Title,
        "originaltitle" | "titleoriginal" | "originalname" => Field::TitleOriginal,
        "author" | "authors" | "writer" => Field::Author,
        "publisher" | "publishinghouse" => Field::Publisher,
        "genre" | "genres" => Field::Genre,
        "format" | "binding" => Field::Format,
        "category" | "categories" | "fictionnonfiction" | "type" => Field::Category,
        "price" | "cost" => Field::Price,
        "frontcover" | "frontcoverimage" | "cover" | "coverimage" | "image" => Field::FrontCover,
        "backcover" | "backcoverimage" => Field::BackCover,
        _ => return None,
    };
    Some(field)
}

/// Column positions for each attribute, resolved once per file
#[derive(Debug, Default)]
struct ColumnLayout {
    /// First matching column per attribute, with its original header
    columns: BTreeMap<Field, (usize, String)>,
    /// Every ISBN column, left to right
    isbn_columns: Vec<usize>,
}

impl ColumnLayout {
    fn from_header(header: &[String]) -> Self {
        let mut layout = ColumnLayout::default();
        for (index, name) in header.iter().enumerate() {
            let Some(field) = attribute_for(&reduce_header(name)) else {
                continue;
            };
            if field == Field::Isbn {
                layout.isbn_columns.push(index);
            }
            layout
                .columns
                .entry(field)
                .or_insert_with(|| (index, name.clone()));
        }
        layout
    }

    fn report(&self) -> ColumnReport {
        let mut report = ColumnReport::default();
        for field in Field::ALL {
            match self.columns.get(&field) {
                Some((_, header)) => report.found.push((field, header.clone())),
                None => report.synthesized.push(field),
            }
        }
        report
    }

    fn cell<'a>(&self, field: Field, row: &'a [RawCell]) -> Option<&'a RawCell> {
        self.columns
            .get(&field)
            .and_then(|(index, _)| row.get(*index))
    }

    fn text(&self, field: Field, row: &[RawCell]) -> String {
        self.cell(field, row).map(RawCell::to_text).unwrap_or_default()
    }

    fn build(
        &self,
        row_number: usize,
        row: &[RawCell],
        warnings: &mut Vec<FieldCoercionWarning>,
    ) -> BookRecord {
        let price = match self.cell(Field::Price, row).map(parse_price) {
            Some(Ok(price)) => price,
            Some(Err(PriceError::Invalid(raw))) => {
                warnings.push(FieldCoercionWarning {
                    row: row_number,
                    field: Field::Price,
                    raw,
                });
                0.0
            }
            Some(Err(PriceError::Missing)) | None => 0.0,
        };

        // First non-empty ISBN column wins
        let raw_isbn = self
            .isbn_columns
            .iter()
            .filter_map(|index| row.get(*index))
            .map(RawCell::to_text)
            .find(|value| !value.is_empty())
            .unwrap_or_default();
        let isbn = normalize_isbn(&raw_isbn);
        if isbn.is_empty() && !raw_isbn.is_empty() {
            warnings.push(FieldCoercionWarning {
                row: row_number,
                field: Field::Isbn,
                raw: raw_isbn,
            });
        }

        BookRecord {
            title: self.text(Field::Title, row),
            title_original: self.text(Field::TitleOriginal, row),
            author: self.text(Field::Author, row),
            publisher: self.text(Field::Publisher, row),
            genre: self.text(Field::Genre, row),
            format: self.text(Field::Format, row),
            category: self.text(Field::Category, row),
            price,
            isbn,
            front_cover: self.text(Field::FrontCover, row),
            back_cover: self.text(Field::BackCover, row),
        }
    }
}

#[derive(Debug, PartialEq)]
enum PriceError {
    /// Nothing to parse; silently zero
    Missing,
    /// Something was there but it is not a finite number
    Invalid(String),
}

fn parse_price(cell: &RawCell) -> Result<f64, PriceError> {
    match cell {
        RawCell::Empty => Err(PriceError::Missing),
        RawCell::Number(value) if value.is_finite() => Ok(*value),
        RawCell::Number(value) => Err(PriceError::Invalid(value.to_string())),
        RawCell::Text(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return Err(PriceError::Missing);
            }
            trimmed
                .parse::<f64>()
                .ok()
                .filter(|price| price.is_finite())
                .ok_or_else(|| PriceError::Invalid(trimmed.to_string()))
        }
    }
}

/// Keep digits and the check character only; `x` is canonicalized to `X`
pub fn normalize_isbn(raw: &str) -> String {
    raw.chars()
        .filter_map(|c| match c {
            '0'..='9' | 'X' => Some(c),
            'x' => Some('X'),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;
    use std::fs;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_csv_with_original_headers() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "books.csv",
            "Book Name,Author,Genre,Format,Fiction/Non-Fiction,Price,ISBN-13\n\
             Dune,Frank Herbert,Sci-Fi,Paperback,Fiction,450,978-0-441-17271-9\n\
             Sapiens,Yuval Noah Harari,History,Hardcover,Non-Fiction,699.5,\n",
        );

        let catalog = load(&path).unwrap();
        assert_eq!(catalog.len(), 2);

        let dune = &catalog.records[0];
        assert_eq!(dune.title, "Dune");
        assert_eq!(dune.author, "Frank Herbert");
        assert_eq!(dune.category, "Fiction");
        assert_eq!(dune.format, "Paperback");
        assert_eq!(dune.price, 450.0);
        assert_eq!(dune.isbn, "9780441172719");

        let sapiens = &catalog.records[1];
        assert_eq!(sapiens.price, 699.5);
        assert_eq!(sapiens.isbn, "");
        assert!(catalog.warnings.is_empty());
    }

    #[test]
    fn test_missing_columns_are_synthesized() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "books.csv", "Title\nDune\n");

        let catalog = load(&path).unwrap();
        let record = &catalog.records[0];
        assert_eq!(record.title, "Dune");
        assert_eq!(record.author, "");
        assert_eq!(record.isbn, "");
        assert_eq!(record.price, 0.0);
        assert_eq!(catalog.columns.found, vec![(Field::Title, "Title".to_string())]);
        assert_eq!(catalog.columns.synthesized.len(), Field::ALL.len() - 1);
        assert!(catalog.columns.synthesized.contains(&Field::Category));
    }

    #[test]
    fn test_malformed_price_coerces_to_zero() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "books.csv",
            "Title,Price\nDune,N/A\nHyperion,\nEmpire,-5\n",
        );

        let catalog = load(&path).unwrap();
        let prices: Vec<f64> = catalog.records.iter().map(|r| r.price).collect();
        assert_eq!(prices, vec![0.0, 0.0, -5.0]);

        // Only the unparsable value is reported; an empty cell is just missing
        assert_eq!(
            catalog.warnings,
            vec![FieldCoercionWarning {
                row: 2,
                field: Field::Price,
                raw: "N/A".to_string(),
            }]
        );
    }

    #[test]
    fn test_non_finite_price_is_rejected() {
        assert_eq!(
            parse_price(&RawCell::Text("inf".to_string())),
            Err(PriceError::Invalid("inf".to_string()))
        );
        assert_eq!(parse_price(&RawCell::Number(12.0)), Ok(12.0));
        assert_eq!(parse_price(&RawCell::Text("  ".to_string())), Err(PriceError::Missing));
    }

    #[test]
    fn test_isbn_normalization() {
        assert_eq!(normalize_isbn("978-0-306-40615-7"), "9780306406157");
        assert_eq!(normalize_isbn("0-8044-2957-x"), "080442957X");
        assert_eq!(normalize_isbn("ISBN 0 8044 2957 X"), "080442957X");
        assert_eq!(normalize_isbn(""), "");
    }

    #[test]
    fn test_isbn_without_digits_warns() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "books.csv", "Title,isbn 10\nDune,unknown\n");

        let catalog = load(&path).unwrap();
        assert_eq!(catalog.records[0].isbn, "");
        assert_eq!(catalog.warnings.len(), 1);
        assert_eq!(catalog.warnings[0].field, Field::Isbn);
    }

    #[test]
    fn test_first_non_empty_isbn_column_wins() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "books.csv",
            "Title,ISBN-13,ISBN-10\nDune,,0441172717\nEmma,9780141439587,0141439580\n",
        );

        let catalog = load(&path).unwrap();
        assert_eq!(catalog.records[0].isbn, "0441172717");
        assert_eq!(catalog.records[1].isbn, "9780141439587");
    }

    #[test]
    fn test_short_and_blank_rows() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "books.csv",
            "Title,Author,Publisher\nDune\n,,\nEmma,Jane Austen\n",
        );

        let catalog = load(&path).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.records[0].author, "");
        assert_eq!(catalog.records[1].author, "Jane Austen");
        assert_eq!(catalog.records[1].publisher, "");
    }

    #[test]
    fn test_tab_separated_file() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "books.tsv", "Title\tAuthor\nDune\tFrank Herbert\n");

        let catalog = load(&path).unwrap();
        assert_eq!(catalog.records[0].author, "Frank Herbert");
    }

    #[test]
    fn test_latin1_csv_is_decoded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("books.csv");
        fs::write(&path, b"Title,Author\nCaf\xe9 Noir,Ana\nDune,Frank Herbert\n").unwrap();

        let catalog = load(&path).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.records[0].title, "Café Noir");
        assert_eq!(catalog.records[1].title, "Dune");
    }

    #[test]
    fn test_load_xlsx_workbook() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("books.xlsx");

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, header) in ["Book Name", "Author", "Genre", "Price", "ISBN"]
            .into_iter()
            .enumerate()
        {
            sheet.write_string(0, col as u16, header).unwrap();
        }
        sheet.write_string(1, 0, "Dune").unwrap();
        sheet.write_string(1, 1, "Frank Herbert").unwrap();
        sheet.write_string(1, 2, "Sci-Fi").unwrap();
        sheet.write_number(1, 3, 450).unwrap();
        sheet.write_number(1, 4, 9780441172719.0).unwrap();
        // Row 3 of the sheet stays blank
        sheet.write_string(3, 0, "Emma").unwrap();
        sheet.write_string(3, 1, "Jane Austen").unwrap();
        sheet.write_number(3, 3, 199.5).unwrap();
        sheet.write_string(3, 4, "978-0-14-143958-7").unwrap();
        sheet.write_string(4, 0, "Sapiens").unwrap();
        sheet.write_string(4, 3, "N/A").unwrap();
        workbook.save(&path).unwrap();

        let catalog = load(&path).unwrap();
        let titles: Vec<&str> = catalog.records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Dune", "Emma", "Sapiens"]);

        let prices: Vec<f64> = catalog.records.iter().map(|r| r.price).collect();
        assert_eq!(prices, vec![450.0, 199.5, 0.0]);

        assert_eq!(catalog.records[0].isbn, "9780441172719");
        assert_eq!(catalog.records[0].genre, "Sci-Fi");
        assert_eq!(catalog.records[1].isbn, "9780141439587");
        assert_eq!(catalog.records[1].genre, "");

        // The blank row still counts towards row numbers
        assert_eq!(
            catalog.warnings,
            vec![FieldCoercionWarning {
                row: 5,
                field: Field::Price,
                raw: "N/A".to_string(),
            }]
        );
    }

    #[test]
    fn test_empty_file_is_empty_catalog() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "books.csv", "");

        let catalog = load(&path).unwrap();
        assert!(catalog.is_empty());
        assert_eq!(catalog.columns.synthesized.len(), Field::ALL.len());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let result = load(&dir.path().join("nope.xlsx"));
        assert!(matches!(result, Err(DataSourceError::NotFound(_))));
    }

    #[test]
    fn test_unknown_extension_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "books.txt", "Title\nDune\n");
        assert!(matches!(load(&path), Err(DataSourceError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_corrupt_workbook_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "books.xlsx", "this is not a zip archive");
        assert!(matches!(load(&path), Err(DataSourceError::Spreadsheet { .. })));
    }

    #[test]
    fn test_numeric_cells_render_without_fraction() {
        assert_eq!(RawCell::Number(9780441172719.0).to_text(), "9780441172719");
        assert_eq!(RawCell::Number(12.5).to_text(), "12.5");
        assert_eq!(RawCell::from(&Data::Int(42)), RawCell::Number(42.0));
    }

    #[test]
    fn test_header_reduction() {
        assert_eq!(attribute_for(&reduce_header("ISBN-13")), Some(Field::Isbn));
        assert_eq!(attribute_for(&reduce_header("isbn 10")), Some(Field::Isbn));
        assert_eq!(attribute_for(&reduce_header("Original Title")), Some(Field::TitleOriginal));
        assert_eq!(attribute_for(&reduce_header("Front Cover")), Some(Field::FrontCover));
        assert_eq!(attribute_for(&reduce_header("Notes")), None);
    }
}
