//! Forward segmentation of one encounter's ICU segments into groups

use std::cmp::Ordering;

use chrono::NaiveDateTime;

use crate::models::{IcuSegment, IcuStayInterval, LocationEvent};
use crate::utils::time::gap_hours;

/// Total order used before stitching: encounter, start, end, then the remaining fields
#[must_use]
pub fn stitch_order(a: &LocationEvent, b: &LocationEvent) -> Ordering {
    a.encounter_block
        .cmp(&b.encounter_block)
        .then_with(|| a.in_dttm.cmp(&b.in_dttm))
        .then_with(|| a.out_dttm.cmp(&b.out_dttm))
        .then_with(|| a.location_category.cmp(&b.location_category))
        .then_with(|| a.location_type.cmp(&b.location_type))
        .then_with(|| a.patient_id.cmp(&b.patient_id))
        .then_with(|| a.hospitalization_id.cmp(&b.hospitalization_id))
}

/// Assign initial ranks, gaps, link flags and groups to one encounter's segments
///
/// `rows` must belong to one encounter, be deduplicated and sorted with
/// [`stitch_order`]. The gap of a segment is measured from the running end of its
/// group, which equals the segment's own end unless an earlier member ends later.
pub fn segment_encounter(rows: &[&LocationEvent], threshold_hours: f64) -> Vec<IcuSegment> {
    let mut segments = Vec::with_capacity(rows.len());
    let mut initial_rank = 0;
    let mut previous_in: Option<NaiveDateTime> = None;
    let mut icu_group = 1;
    let mut group_end: Option<NaiveDateTime> = None;

    for (idx, event) in rows.iter().enumerate() {
        if previous_in != Some(event.in_dttm) {
            initial_rank += 1;
            previous_in = Some(event.in_dttm);
        }

        let end = group_end.map_or(event.out_dttm, |end| end.max(event.out_dttm));
        let out_to_next_hours = rows.get(idx + 1).map(|next| gap_hours(end, next.in_dttm));
        let linked = out_to_next_hours.is_some_and(|gap| gap < threshold_hours);

        segments.push(IcuSegment {
            event: (*event).clone(),
            initial_rank,
            out_to_next_hours,
            linked,
            icu_group,
        });

        if linked {
            group_end = Some(end);
        } else {
            group_end = None;
            icu_group += 1;
        }
    }

    segments
}

/// Collapse one encounter's segments into ranked ICU stays
///
/// `segments` must come from [`segment_encounter`] for a single encounter.
#[must_use]
pub fn aggregate_encounter(segments: &[IcuSegment]) -> Vec<IcuStayInterval> {
    let mut stays: Vec<IcuStayInterval> = segments
        .chunk_by(|a, b| a.icu_group == b.icu_group)
        .filter_map(aggregate_group)
        .collect();

    stays.sort_by(|a, b| {
        a.in_dttm
            .cmp(&b.in_dttm)
            .then_with(|| a.icu_group.cmp(&b.icu_group))
    });
    for (rank, stay) in (1..).zip(stays.iter_mut()) {
        stay.icu_rank = rank;
    }

    stays
}

fn aggregate_group(members: &[IcuSegment]) -> Option<IcuStayInterval> {
    let (first, rest) = members.split_first()?;
    let mut stay = IcuStayInterval {
        encounter_block: first.event.encounter_block.clone(),
        icu_group: first.icu_group,
        icu_rank: 0,
        in_dttm: first.event.in_dttm,
        out_dttm: first.event.out_dttm,
        location_type: first.event.location_type.clone(),
    };

    for member in rest {
        stay.in_dttm = stay.in_dttm.min(member.event.in_dttm);
        // Ties on the latest end go to the member later in rank order
        if member.event.out_dttm >= stay.out_dttm {
            stay.out_dttm = member.event.out_dttm;
            stay.location_type.clone_from(&member.event.location_type);
        }
    }

    Some(stay)
}
