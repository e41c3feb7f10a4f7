//! Edit scripts between two display lists
//!
//! When a view reloads, the renderer gets a list of operations that turns
//! the old list into the new one instead of a full redraw. Items are matched
//! by identity ([`DisplayItem::same_item`]); matched items whose content
//! changed produce an update.

use super::data::DisplayItem;

/// One step of an edit script
///
/// Indices refer to the list as it stands after all earlier steps have been
/// applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOp {
    Remove { index: usize },
    Insert { index: usize, item: DisplayItem },
    Update { index: usize, item: DisplayItem },
}

/// Compute a minimal edit script from `old` to `new`
///
/// The number of inserts and removes is minimal (LCS over item identity).
/// Common prefix and suffix are matched up front, so a reload that changes
/// one section costs little.
pub fn diff(old: &[DisplayItem], new: &[DisplayItem]) -> Vec<EditOp> {
    let prefix = old
        .iter()
        .zip(new)
        .take_while(|(a, b)| a.same_item(b))
        .count();
    let suffix = old[prefix..]
        .iter()
        .rev()
        .zip(new[prefix..].iter().rev())
        .take_while(|(a, b)| a.same_item(b))
        .count();

    let old_mid = &old[prefix..old.len() - suffix];
    let new_mid = &new[prefix..new.len() - suffix];

    let mut ops = Vec::new();

    for (index, (a, b)) in old[..prefix].iter().zip(&new[..prefix]).enumerate() {
        if !a.same_content(b) {
            ops.push(EditOp::Update { index, item: b.clone() });
        }
    }

    diff_middle(old_mid, new_mid, prefix, &mut ops);

    let base = prefix + new_mid.len();
    let old_tail = &old[old.len() - suffix..];
    let new_tail = &new[new.len() - suffix..];
    for (offset, (a, b)) in old_tail.iter().zip(new_tail).enumerate() {
        if !a.same_content(b) {
            ops.push(EditOp::Update {
                index: base + offset,
                item: b.clone(),
            });
        }
    }

    ops
}

/// Largest LCS table (in cells) built before giving up on a minimal script
const MAX_LCS_CELLS: usize = 4_000_000;

fn diff_middle(old: &[DisplayItem], new: &[DisplayItem], start: usize, ops: &mut Vec<EditOp>) {
    let (n, m) = (old.len(), new.len());

    if n.saturating_add(1).saturating_mul(m.saturating_add(1)) > MAX_LCS_CELLS {
        replace_all(new, start, n, ops);
        return;
    }

    // lcs[i][j] = LCS length of old[i..] and new[j..]
    let width = m + 1;
    let mut lcs = vec![0u32; (n + 1) * width];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lcs[i * width + j] = if old[i].same_item(&new[j]) {
                lcs[(i + 1) * width + j + 1] + 1
            } else {
                lcs[(i + 1) * width + j].max(lcs[i * width + j + 1])
            };
        }
    }

    let (mut i, mut j, mut pos) = (0, 0, start);
    while i < n || j < m {
        if i < n && j < m && old[i].same_item(&new[j]) {
            if !old[i].same_content(&new[j]) {
                ops.push(EditOp::Update {
                    index: pos,
                    item: new[j].clone(),
                });
            }
            i += 1;
            j += 1;
            pos += 1;
        } else if j < m && (i == n || lcs[i * width + j + 1] >= lcs[(i + 1) * width + j]) {
            ops.push(EditOp::Insert {
                index: pos,
                item: new[j].clone(),
            });
            j += 1;
            pos += 1;
        } else {
            ops.push(EditOp::Remove { index: pos });
            i += 1;
        }
    }
}

/// Remove `removed` items at `start`, then insert all of `new` there
fn replace_all(new: &[DisplayItem], start: usize, removed: usize, ops: &mut Vec<EditOp>) {
    ops.extend((0..removed).map(|_| EditOp::Remove { index: start }));
    ops.extend(new.iter().enumerate().map(|(offset, item)| EditOp::Insert {
        index: start + offset,
        item: item.clone(),
    }));
}

/// Apply an edit script to a list
pub fn apply(list: &mut Vec<DisplayItem>, ops: &[EditOp]) {
    for op in ops {
        match op {
            EditOp::Remove { index } => {
                list.remove(*index);
            }
            EditOp::Insert { index, item } => list.insert(*index, item.clone()),
            EditOp::Update { index, item } => list[*index] = item.clone(),
        }
    }
}
