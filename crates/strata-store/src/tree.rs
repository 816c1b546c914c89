//! Path operations on one level's data
//!
//! Writes are two-pass: [`check_write`] validates the whole path without
//! touching anything, then [`slot_mut`] walks it again creating missing
//! mappings. A write that fails therefore never leaves vivified containers
//! behind.

use crate::error::{AttrError, AttrResult};
use crate::level::Level;
use strata_value::{AttrPath, Mapping, NodeKind, Segment, Value};

/// Validate that `path` can be written in `root`
///
/// With `vivify`, missing mappings along the path may be created; without it
/// the first missing container is an error.
pub(crate) fn check_write(
    root: &Mapping,
    level: Level,
    path: &AttrPath,
    vivify: bool,
) -> AttrResult<()> {
    let segments = path.segments();
    let Some(first) = segments.first() else {
        return Err(AttrError::EmptyPath);
    };
    let Segment::Key(key) = first else {
        return Err(AttrError::segment_conflict(
            level,
            AttrPath::root(),
            first,
            NodeKind::Mapping,
        ));
    };

    let mut current = root.get(key);
    for (depth, segment) in segments.iter().enumerate().skip(1) {
        let Some(container) = current else {
            return check_vivify(level, path, depth, vivify);
        };
        current = match (container, segment) {
            (Value::Mapping(m), Segment::Key(k)) => m.get(k),
            (Value::Sequence(s), Segment::Index(i)) => match s.get(*i) {
                Some(item) => Some(item),
                None => {
                    return Err(AttrError::index_out_of_bounds(
                        level,
                        path.prefix(depth),
                        *i,
                        s.len(),
                    ))
                }
            },
            (other, segment) => {
                return Err(AttrError::segment_conflict(
                    level,
                    path.prefix(depth),
                    segment,
                    other.kind(),
                ))
            }
        };
    }
    Ok(())
}

/// The value at `path.prefix(depth)` is missing: everything from there on
/// would be a freshly created mapping
fn check_vivify(level: Level, path: &AttrPath, depth: usize, vivify: bool) -> AttrResult<()> {
    if !vivify {
        return Err(AttrError::missing_intermediate(level, path.prefix(depth)));
    }
    let segments = path.segments();
    for (offset, segment) in segments[depth..].iter().enumerate() {
        if let Segment::Index(_) = segment {
            return Err(AttrError::segment_conflict(
                level,
                path.prefix(depth + offset),
                segment,
                NodeKind::Absent,
            ));
        }
    }
    Ok(())
}

/// Mutable slot at `path`, creating missing mappings on the way
///
/// A missing final key is filled with `make()`. Callers run
/// [`check_write`] first; errors here only repeat what it reports.
pub(crate) fn slot_mut<'m>(
    root: &'m mut Mapping,
    level: Level,
    path: &AttrPath,
    make: impl FnOnce() -> Value,
) -> AttrResult<&'m mut Value> {
    let Some((last, parents)) = path.segments().split_last() else {
        return Err(AttrError::EmptyPath);
    };

    let Some((first, rest)) = parents.split_first() else {
        return match last {
            Segment::Key(key) => Ok(root.entry_or_insert_with(key, make)),
            Segment::Index(_) => Err(AttrError::segment_conflict(
                level,
                AttrPath::root(),
                last,
                NodeKind::Mapping,
            )),
        };
    };
    let Segment::Key(key) = first else {
        return Err(AttrError::segment_conflict(
            level,
            AttrPath::root(),
            first,
            NodeKind::Mapping,
        ));
    };

    let mut node = root.entry_or_mapping(key);
    for (offset, segment) in rest.iter().enumerate() {
        node = step_mut(node, segment, level, || path.prefix(offset + 1))?;
    }

    let parent = || path.prefix(parents.len());
    match (node, last) {
        (Value::Mapping(m), Segment::Key(k)) => Ok(m.entry_or_insert_with(k, make)),
        (Value::Sequence(s), Segment::Index(i)) => {
            let len = s.len();
            s.get_mut(*i)
                .ok_or_else(|| AttrError::index_out_of_bounds(level, parent(), *i, len))
        }
        (other, segment) => Err(AttrError::segment_conflict(
            level,
            parent(),
            segment,
            other.kind(),
        )),
    }
}

fn step_mut<'v>(
    node: &'v mut Value,
    segment: &Segment,
    level: Level,
    at: impl Fn() -> AttrPath,
) -> AttrResult<&'v mut Value> {
    match (node, segment) {
        (Value::Mapping(m), Segment::Key(k)) => Ok(m.entry_or_mapping(k)),
        (Value::Sequence(s), Segment::Index(i)) => {
            let len = s.len();
            s.get_mut(*i)
                .ok_or_else(|| AttrError::index_out_of_bounds(level, at(), *i, len))
        }
        (other, segment) => Err(AttrError::segment_conflict(level, at(), segment, other.kind())),
    }
}

/// Mutable value at `path` without creating anything
pub(crate) fn get_mut<'m>(root: &'m mut Mapping, path: &AttrPath) -> Option<&'m mut Value> {
    let (first, rest) = path.segments().split_first()?;
    let mut node = root.get_mut(first.as_key()?)?;
    for segment in rest {
        node = node.child_mut(segment)?;
    }
    Some(node)
}

/// Remove the value at `path`, if present
///
/// Missing intermediates and mismatched containers simply yield `None`.
pub(crate) fn unlink(root: &mut Mapping, path: &AttrPath) -> Option<Value> {
    let (last, parents) = path.segments().split_last()?;
    if parents.is_empty() {
        return root.remove(last.as_key()?);
    }
    match (get_mut(root, &AttrPath::from(parents))?, last) {
        (Value::Mapping(m), Segment::Key(k)) => m.remove(k),
        (Value::Sequence(s), Segment::Index(i)) => s.remove(*i),
        _ => None,
    }
}
