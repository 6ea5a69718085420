//! Contiguity merger: collapses one user's back-to-back shifts of a day into
//! maximal display blocks.

use std::collections::HashMap;

use crate::models::{DisplayBlock, Role, Shift};

/// Merge a day's shifts for one user into maximal contiguous blocks.
///
/// Two consecutive shifts fuse iff they share the role, the earlier one ends
/// exactly where the later one starts, and — for instructors only — they
/// carry the same course type id (both absent counts as equal). Blocks are
/// maximal, so merging the output again changes nothing.
///
/// `course_names` maps course type ids to display names for the
/// `merged_course` field of instructor blocks.
pub fn merge_day(shifts: &[Shift], course_names: &HashMap<i32, String>) -> Vec<DisplayBlock> {
    if shifts.is_empty() {
        return Vec::new();
    }

    let mut sorted: Vec<&Shift> = shifts.iter().collect();
    // Stable: ties keep their original order.
    sorted.sort_by_key(|s| s.start_time);

    let mut blocks: Vec<DisplayBlock> = Vec::new();
    let mut run: Vec<&Shift> = vec![sorted[0]];

    for shift in &sorted[1..] {
        let prev = run.last().expect("run is never empty");
        if mergeable(prev, shift) {
            run.push(shift);
        } else {
            blocks.push(close_run(&run, course_names));
            run = vec![shift];
        }
    }
    blocks.push(close_run(&run, course_names));

    blocks
}

fn mergeable(a: &Shift, b: &Shift) -> bool {
    if a.role != b.role || a.end_time != b.start_time {
        return false;
    }
    // Course type is part of the merge key for instructors only.
    a.role != Role::Instructor || a.course_type_id == b.course_type_id
}

fn close_run(run: &[&Shift], course_names: &HashMap<i32, String>) -> DisplayBlock {
    let first = run[0];
    let last = run[run.len() - 1];
    let is_merged = run.len() > 1;

    let merged_course = if is_merged && first.role == Role::Instructor {
        first
            .course_type_id
            .and_then(|id| course_names.get(&id).cloned())
    } else {
        None
    };

    DisplayBlock {
        role: first.role,
        start_time: first.start_time,
        end_time: last.end_time,
        course_type_id: first.course_type_id,
        merged_course,
        merged_count: run.len(),
        is_merged,
    }
}
