use crate::{
	error::Error,
	store::{ContentStore, Query},
	uri::ContentReference,
};

use tracing::{debug, error};

/// Reads a single column of the first row the store returns for `reference`.
///
/// Absence is a normal outcome: no cursor, zero rows, a missing column, a null or empty value and
/// store failures all come back as `None`. The cursor is dropped, and thus released, before we
/// return on every path.
pub fn query_column(
	store: &(impl ContentStore + ?Sized),
	reference: &ContentReference,
	column: &'static str,
	selection: Option<&str>,
	selection_args: &[&str],
) -> Option<String> {
	match try_query_column(store, reference, column, selection, selection_args) {
		Ok(Some(value)) if !value.is_empty() => Some(value),
		Ok(_) => {
			debug!(%reference, column, "No value for column");
			None
		}
		Err(e) => {
			error!(%reference, column, ?e, "Failed to query column;");
			None
		}
	}
}

fn try_query_column(
	store: &(impl ContentStore + ?Sized),
	reference: &ContentReference,
	column: &'static str,
	selection: Option<&str>,
	selection_args: &[&str],
) -> Result<Option<String>, Error> {
	let projection = [column];
	let mut query = Query::columns(&projection);
	if let Some(selection) = selection {
		query = query.filtered(selection, selection_args);
	}

	let Some(mut cursor) = store.query(reference, query)? else {
		return Ok(None);
	};

	if !cursor.move_to_first() {
		return Ok(None);
	}

	cursor
		.column_index(column)
		.map_or(Ok(None), |index| cursor.get_string(index).map_err(Into::into))
}
