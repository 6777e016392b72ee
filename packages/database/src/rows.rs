//! Column layout of the record tables.
//!
//! [`TableRow`] describes how a record type maps onto a table: its
//! columns and SQL types, which of them form the key, how to bind a record
//! as statement parameters, and how to read one back. Both the upsert
//! loader and the parquet writer are generic over it.

use std::str::FromStr;

use duckdb::types::Type;
use duckdb::{Row, Statement};
use herd_knowledge_wildlife_models::{
    HarvestRecord, HerdPopulationRecord, ReportKind, Species, StateCode,
};

use crate::DbError;

/// A record type that can be stored as one table row.
pub trait TableRow: Sized {
    /// Natural key used to de-duplicate a batch.
    type Key: Ord;

    /// Report kind, used as the table name suffix.
    const KIND: ReportKind;

    /// `(name, SQL type)` for every column, in bind order.
    const COLUMNS: &'static [(&'static str, &'static str)];

    /// Columns forming the composite primary key.
    const KEY_COLUMNS: &'static [&'static str];

    fn species(&self) -> Species;

    /// Returns the record's key.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::MissingKey`] if a key field is absent.
    fn key(&self, table: &str, index: usize) -> Result<Self::Key, DbError>;

    /// Binds every column starting at parameter `first` (1-based).
    ///
    /// # Errors
    ///
    /// Returns a `DuckDB` error if a parameter cannot be bound.
    fn bind(&self, stmt: &mut Statement<'_>, first: usize) -> duckdb::Result<()>;

    /// Reads a record from a row whose columns follow [`Self::COLUMNS`].
    ///
    /// # Errors
    ///
    /// Returns a `DuckDB` error if a value has the wrong type or an enum
    /// field holds an unknown name.
    fn from_row(row: &Row<'_>) -> duckdb::Result<Self>;
}

/// Table name for a species and record type, e.g. `elk_population`.
#[must_use]
pub fn table_name<R: TableRow>(species: Species) -> String {
    format!("{species}_{}", R::KIND)
}

/// `CREATE TABLE` body. With `with_key`, key columns are `NOT NULL` and a
/// primary key is declared; without it every column is nullable.
pub(crate) fn column_definitions<R: TableRow>(with_key: bool) -> String {
    let mut defs: Vec<String> = R::COLUMNS
        .iter()
        .map(|(name, ty)| {
            if with_key && R::KEY_COLUMNS.contains(name) {
                format!("{name} {ty} NOT NULL")
            } else {
                format!("{name} {ty}")
            }
        })
        .collect();

    if with_key {
        defs.push(format!("PRIMARY KEY ({})", R::KEY_COLUMNS.join(", ")));
    }

    defs.join(",\n    ")
}

fn parse_enum<T>(row: &Row<'_>, idx: usize) -> duckdb::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| duckdb::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

impl TableRow for HerdPopulationRecord {
    type Key = (StateCode, String, i32);

    const KIND: ReportKind = ReportKind::Population;

    const COLUMNS: &'static [(&'static str, &'static str)] = &[
        ("state", "VARCHAR"),
        ("species", "VARCHAR"),
        ("year", "INTEGER"),
        ("dau", "VARCHAR"),
        ("herd_name", "VARCHAR"),
        ("gmu_list", "VARCHAR"),
        ("post_hunt_estimate", "BIGINT"),
        ("male_female_ratio", "DOUBLE"),
    ];

    const KEY_COLUMNS: &'static [&'static str] = &["state", "herd_name", "year"];

    fn species(&self) -> Species {
        self.species
    }

    fn key(&self, table: &str, index: usize) -> Result<Self::Key, DbError> {
        let herd_name = self.herd_name.clone().ok_or_else(|| DbError::MissingKey {
            table: table.to_string(),
            field: "herd_name",
            index,
        })?;
        Ok((self.state, herd_name, self.year))
    }

    fn bind(&self, stmt: &mut Statement<'_>, first: usize) -> duckdb::Result<()> {
        stmt.raw_bind_parameter(first, self.state.as_ref())?;
        stmt.raw_bind_parameter(first + 1, self.species.as_ref())?;
        stmt.raw_bind_parameter(first + 2, self.year)?;
        stmt.raw_bind_parameter(first + 3, self.dau.as_deref())?;
        stmt.raw_bind_parameter(first + 4, self.herd_name.as_deref())?;
        stmt.raw_bind_parameter(first + 5, self.gmu_list.as_deref())?;
        stmt.raw_bind_parameter(first + 6, self.post_hunt_estimate)?;
        stmt.raw_bind_parameter(first + 7, self.male_female_ratio)?;
        Ok(())
    }

    fn from_row(row: &Row<'_>) -> duckdb::Result<Self> {
        Ok(Self {
            state: parse_enum(row, 0)?,
            species: parse_enum(row, 1)?,
            year: row.get(2)?,
            dau: row.get(3)?,
            herd_name: row.get(4)?,
            gmu_list: row.get(5)?,
            post_hunt_estimate: row.get(6)?,
            male_female_ratio: row.get(7)?,
        })
    }
}

impl TableRow for HarvestRecord {
    type Key = (StateCode, String, i32, i64);

    const KIND: ReportKind = ReportKind::Harvest;

    const COLUMNS: &'static [(&'static str, &'static str)] = &[
        ("state", "VARCHAR"),
        ("species", "VARCHAR"),
        ("season", "VARCHAR"),
        ("year", "INTEGER"),
        ("unit", "BIGINT"),
        ("adult_male", "BIGINT"),
        ("adult_female", "BIGINT"),
        ("young", "BIGINT"),
        ("total_harvest", "BIGINT"),
        ("total_hunters", "BIGINT"),
        ("percent_success", "DOUBLE"),
        ("total_rec_days", "BIGINT"),
    ];

    const KEY_COLUMNS: &'static [&'static str] = &["state", "season", "year", "unit"];

    fn species(&self) -> Species {
        self.species
    }

    fn key(&self, _table: &str, _index: usize) -> Result<Self::Key, DbError> {
        Ok((self.state, self.season.clone(), self.year, self.unit))
    }

    fn bind(&self, stmt: &mut Statement<'_>, first: usize) -> duckdb::Result<()> {
        stmt.raw_bind_parameter(first, self.state.as_ref())?;
        stmt.raw_bind_parameter(first + 1, self.species.as_ref())?;
        stmt.raw_bind_parameter(first + 2, &self.season)?;
        stmt.raw_bind_parameter(first + 3, self.year)?;
        stmt.raw_bind_parameter(first + 4, self.unit)?;
        stmt.raw_bind_parameter(first + 5, self.adult_male)?;
        stmt.raw_bind_parameter(first + 6, self.adult_female)?;
        stmt.raw_bind_parameter(first + 7, self.young)?;
        stmt.raw_bind_parameter(first + 8, self.total_harvest)?;
        stmt.raw_bind_parameter(first + 9, self.total_hunters)?;
        stmt.raw_bind_parameter(first + 10, self.percent_success)?;
        stmt.raw_bind_parameter(first + 11, self.total_rec_days)?;
        Ok(())
    }

    fn from_row(row: &Row<'_>) -> duckdb::Result<Self> {
        Ok(Self {
            state: parse_enum(row, 0)?,
            species: parse_enum(row, 1)?,
            season: row.get(2)?,
            year: row.get(3)?,
            unit: row.get(4)?,
            adult_male: row.get(5)?,
            adult_female: row.get(6)?,
            young: row.get(7)?,
            total_harvest: row.get(8)?,
            total_hunters: row.get(9)?,
            percent_success: row.get(10)?,
            total_rec_days: row.get(11)?,
        })
    }
}
