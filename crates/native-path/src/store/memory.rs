use super::{ContentStore, ContentStream, Cursor, Query};
use crate::{error::StoreError, uri::ContentReference};

use std::{
	collections::{HashMap, HashSet},
	io::{self, Read},
	sync::{
		atomic::{AtomicUsize, Ordering},
		Arc, Mutex, PoisonError,
	},
};

/// A single cell of a [`Row`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
	Null,
	Text(String),
	Blob(Vec<u8>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
	columns: Vec<(String, Value)>,
}

impl Row {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn text(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
		self.columns.push((column.into(), Value::Text(value.into())));
		self
	}

	#[must_use]
	pub fn blob(mut self, column: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
		self.columns.push((column.into(), Value::Blob(value.into())));
		self
	}

	#[must_use]
	pub fn null(mut self, column: impl Into<String>) -> Self {
		self.columns.push((column.into(), Value::Null));
		self
	}

	fn get(&self, column: &str) -> Option<&Value> {
		self.columns
			.iter()
			.find_map(|(name, value)| (name == column).then_some(value))
	}
}

#[derive(Debug, Clone)]
struct StreamFixture {
	bytes: Arc<[u8]>,
	available: Option<u64>,
	fail_after: Option<usize>,
}

#[derive(Debug, Default)]
struct Stats {
	queried: Mutex<Vec<String>>,
	live_cursors: AtomicUsize,
	opened_streams: AtomicUsize,
}

/// In-memory [`ContentStore`], for hosts without a platform provider bridge and for tests.
///
/// Keeps track of every query it answers and of the cursors still alive, so callers can verify
/// that resolution released everything it opened.
#[derive(Debug, Default)]
pub struct MemoryStore {
	rows: HashMap<String, Vec<Row>>,
	streams: HashMap<String, StreamFixture>,
	failing_queries: HashSet<String>,
	stats: Arc<Stats>,
}

impl MemoryStore {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn with_row(mut self, uri: impl Into<String>, row: Row) -> Self {
		self.rows.entry(uri.into()).or_default().push(row);
		self
	}

	/// Registers a stream that reports its full length as available.
	#[must_use]
	pub fn with_stream(self, uri: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
		let bytes: Vec<u8> = bytes.into();
		let available = bytes.len() as u64;
		self.with_stream_available(uri, bytes, Some(available))
	}

	#[must_use]
	pub fn with_stream_available(
		mut self,
		uri: impl Into<String>,
		bytes: impl Into<Vec<u8>>,
		available: Option<u64>,
	) -> Self {
		let bytes: Vec<u8> = bytes.into();
		self.streams.insert(
			uri.into(),
			StreamFixture {
				bytes: bytes.into(),
				available,
				fail_after: None,
			},
		);
		self
	}

	/// Registers a stream that errors out once `fail_after` bytes were read.
	#[must_use]
	pub fn with_broken_stream(
		mut self,
		uri: impl Into<String>,
		bytes: impl Into<Vec<u8>>,
		fail_after: usize,
	) -> Self {
		let bytes: Vec<u8> = bytes.into();
		let available = Some(bytes.len() as u64);
		self.streams.insert(
			uri.into(),
			StreamFixture {
				bytes: bytes.into(),
				available,
				fail_after: Some(fail_after),
			},
		);
		self
	}

	#[must_use]
	pub fn with_failing_query(mut self, uri: impl Into<String>) -> Self {
		self.failing_queries.insert(uri.into());
		self
	}

	/// Every uri queried so far, in order.
	#[must_use]
	pub fn queried(&self) -> Vec<String> {
		self.stats
			.queried
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.clone()
	}

	#[must_use]
	pub fn live_cursors(&self) -> usize {
		self.stats.live_cursors.load(Ordering::Acquire)
	}

	#[must_use]
	pub fn opened_streams(&self) -> usize {
		self.stats.opened_streams.load(Ordering::Acquire)
	}

	fn matching_rows(
		&self,
		uri: &str,
		query: Query<'_>,
	) -> Result<Option<Vec<Row>>, StoreError> {
		let Some(rows) = self.rows.get(uri) else {
			return Ok(None);
		};

		let filters = match query.selection {
			Some(selection) => parse_selection(uri, selection, query.selection_args)?,
			None => Vec::new(),
		};

		Ok(Some(
			rows.iter()
				.filter(|row| {
					filters.iter().all(|(column, expected)| {
						matches!(row.get(column), Some(Value::Text(value)) if value == expected)
					})
				})
				.map(|row| match query.projection {
					Some(projection) => Row {
						columns: projection
							.iter()
							.filter_map(|column| {
								row.get(column)
									.map(|value| ((*column).to_string(), value.clone()))
							})
							.collect(),
					},
					None => row.clone(),
				})
				.collect(),
		))
	}
}

/// Understands `a=? AND b=?` style selections, which is all the resolver ever sends.
fn parse_selection<'a>(
	uri: &str,
	selection: &'a str,
	args: &[&'a str],
) -> Result<Vec<(&'a str, &'a str)>, StoreError> {
	let clauses = selection.split(" AND ").collect::<Vec<_>>();
	if clauses.len() != args.len() {
		return Err(StoreError::Query {
			uri: uri.to_string(),
			reason: format!(
				"selection '{selection}' expects {} args, got {}",
				clauses.len(),
				args.len()
			),
		});
	}

	clauses
		.into_iter()
		.zip(args.iter().copied())
		.map(|(clause, arg)| match clause.split_once('=') {
			Some((column, "?")) => Ok((column.trim(), arg)),
			_ => Err(StoreError::Query {
				uri: uri.to_string(),
				reason: format!("unsupported selection clause '{clause}'"),
			}),
		})
		.collect()
}

impl ContentStore for MemoryStore {
	fn query(
		&self,
		reference: &ContentReference,
		query: Query<'_>,
	) -> Result<Option<Box<dyn Cursor + '_>>, StoreError> {
		let uri = reference.as_str();

		self.stats
			.queried
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.push(uri.to_string());

		if self.failing_queries.contains(uri) {
			return Err(StoreError::Query {
				uri: uri.to_string(),
				reason: "provider crashed".to_string(),
			});
		}

		let Some(rows) = self.matching_rows(uri, query)? else {
			return Ok(None);
		};

		self.stats.live_cursors.fetch_add(1, Ordering::AcqRel);

		Ok(Some(Box::new(MemoryCursor {
			rows,
			position: None,
			stats: Arc::clone(&self.stats),
		})))
	}

	fn open_stream(&self, reference: &ContentReference) -> Result<ContentStream, StoreError> {
		let fixture =
			self.streams
				.get(reference.as_str())
				.cloned()
				.ok_or_else(|| StoreError::Open {
					uri: reference.to_string(),
					source: io::Error::new(io::ErrorKind::NotFound, "no stream for reference"),
				})?;

		self.stats.opened_streams.fetch_add(1, Ordering::AcqRel);

		let available = fixture.available;
		Ok(ContentStream::new(
			FixtureReader {
				fixture,
				offset: 0,
			},
			available,
		))
	}
}

struct MemoryCursor {
	rows: Vec<Row>,
	position: Option<usize>,
	stats: Arc<Stats>,
}

impl MemoryCursor {
	fn cell(&self, index: usize) -> Result<&Value, StoreError> {
		self.position
			.and_then(|position| self.rows.get(position))
			.and_then(|row| row.columns.get(index))
			.map(|(_, value)| value)
			.ok_or(StoreError::ColumnOutOfRange(index))
	}
}

impl Cursor for MemoryCursor {
	fn move_to_first(&mut self) -> bool {
		if self.rows.is_empty() {
			self.position = None;
			false
		} else {
			self.position = Some(0);
			true
		}
	}

	fn column_index(&self, name: &str) -> Option<usize> {
		self.rows
			.first()
			.and_then(|row| row.columns.iter().position(|(column, _)| column == name))
	}

	fn get_string(&self, index: usize) -> Result<Option<String>, StoreError> {
		match self.cell(index)? {
			Value::Null => Ok(None),
			Value::Text(value) => Ok(Some(value.clone())),
			Value::Blob(_) => Err(StoreError::ColumnType(index)),
		}
	}

	fn get_blob(&self, index: usize) -> Result<Option<Vec<u8>>, StoreError> {
		match self.cell(index)? {
			Value::Null => Ok(None),
			Value::Blob(value) => Ok(Some(value.clone())),
			Value::Text(value) => Ok(Some(value.clone().into_bytes())),
		}
	}
}

impl Drop for MemoryCursor {
	fn drop(&mut self) {
		self.stats.live_cursors.fetch_sub(1, Ordering::AcqRel);
	}
}

struct FixtureReader {
	fixture: StreamFixture,
	offset: usize,
}

impl Read for FixtureReader {
	fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
		let end = self.fixture.bytes.len();
		if let Some(fail_after) = self.fixture.fail_after {
			if self.offset >= fail_after {
				return Err(io::Error::new(
					io::ErrorKind::BrokenPipe,
					"provider went away mid stream",
				));
			}
		}

		let limit = self
			.fixture
			.fail_after
			.map_or(end, |fail_after| fail_after.min(end));
		let count = buf.len().min(limit.saturating_sub(self.offset));
		buf[..count].copy_from_slice(&self.fixture.bytes[self.offset..self.offset + count]);
		self.offset += count;

		Ok(count)
	}
}
