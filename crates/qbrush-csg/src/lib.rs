#![warn(missing_docs)]

//! CSG operators on brushes: hollow, subtract, merge and split-by-plane.
//!
//! All four are read/copy-heavy and single-threaded, expressed purely in
//! terms of the brush primitives (`add_face`, `flip_face`, plane
//! classification). None of them mutates its inputs' face lists except
//! through those primitives, so undo reduces to restoring a prior face
//! list. Infeasibility is reported, never thrown: a merge that would be
//! non-convex returns an error, a subtraction that consumes everything
//! returns an empty fragment list.

use thiserror::Error;
use tracing::{debug, warn};

use qbrush_brep::{Brush, Face, MaterialInfo, TextureProjection};
use qbrush_math::Plane3;
use qbrush_winding::Winding;

// =============================================================================
// Errors
// =============================================================================

/// Why a merge could not be performed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MergeError {
    /// No input brushes.
    #[error("nothing to merge")]
    NoInput,
    /// Two surviving faces are concave with respect to each other; the
    /// union is not a convex solid.
    #[error("brushes do not form a convex volume")]
    NotConvex,
    /// Inputs carry different materials and matching was required.
    #[error("brushes carry mismatched materials")]
    MaterialMismatch,
    /// The union of outer faces exceeds the per-brush face cap.
    #[error("merged brush would exceed the face cap")]
    TooManyFaces,
}

// =============================================================================
// Hollow
// =============================================================================

/// Hollows a brush: one wall shell per contributing face.
///
/// Each shell is a copy of the source plus one extra face, the source
/// face's plane flipped and offset by `offset`, leaving a wall of that
/// thickness. With `make_room` the matching source plane is pushed outward
/// first so the walls land outside the original volume instead of inside,
/// avoiding overlapping corners. Degenerate shells are discarded.
pub fn hollow(source: &mut Brush, offset: f64, make_room: bool) -> Vec<Brush> {
    source.evaluate_brep();
    let mut shells = Vec::new();
    for i in 0..source.face_count() {
        if !source.face(i).contributes() {
            continue;
        }
        let mut shell = source.clone();
        if make_room {
            shell.offset_face_plane(i, offset);
        }
        let face = source.face(i).clone();
        let Some(index) = shell.add_face(face) else {
            warn!(face = i, "hollow shell hit the face cap, skipped");
            continue;
        };
        shell.flip_face(index);
        if !make_room {
            shell.offset_face_plane(index, offset);
        }
        shell.remove_empty_faces();
        if shell.has_contributing_faces() && !shell.is_degenerate() {
            shells.push(shell);
        } else {
            debug!(face = i, "hollow shell degenerate, discarded");
        }
    }
    debug!(shells = shells.len(), make_room, "hollowed brush");
    shells
}

// =============================================================================
// Subtract
// =============================================================================

/// Subtracts `subtrahend` from `minuend`.
///
/// Walks the subtrahend's contributing faces, keeping a running remainder
/// of the minuend. Whenever the remainder straddles a face plane, the
/// outside part is sliced off as a fragment and the remainder is narrowed
/// by the plane; what is left at the end lies inside the subtrahend and is
/// dropped.
///
/// Returns `None` when the minuend is untouched (disjoint solids), and
/// `Some(fragments)` otherwise; an empty fragment list means the minuend
/// was consumed entirely.
pub fn subtract(minuend: &mut Brush, subtrahend: &mut Brush) -> Option<Vec<Brush>> {
    minuend.evaluate_brep();
    subtrahend.evaluate_brep();
    if !minuend.local_aabb().intersects(&subtrahend.local_aabb()) {
        return None;
    }

    let mut fragments = Vec::new();
    let mut back = minuend.clone();
    for i in 0..subtrahend.face_count() {
        if !subtrahend.face(i).contributes() {
            continue;
        }
        let face = subtrahend.face(i).clone();
        let counts = back.classify_plane(face.plane());
        if counts.is_straddling() {
            let mut fragment = back.clone();
            let Some(index) = fragment.add_face(face.clone()) else {
                warn!("subtract fragment hit the face cap, minuend untouched");
                return None;
            };
            fragment.flip_face(index);
            fragment.remove_empty_faces();
            if fragment.has_contributing_faces() {
                fragments.push(fragment);
            }
            if back.add_face(face).is_none() {
                warn!("subtract remainder hit the face cap, minuend untouched");
                return None;
            }
        } else if counts.back == 0 {
            // Wholly in front of one subtrahend plane: no intersection.
            return None;
        }
    }
    debug!(fragments = fragments.len(), "subtracted brush");
    Some(fragments)
}

// =============================================================================
// Merge
// =============================================================================

/// Merges a set of brushes into one convex brush.
///
/// Collects the union of contributing faces, dropping faces mirrored by an
/// exactly opposing face of another input (shared internal walls cancel)
/// and duplicated planes. Fails if any two surviving faces are concave
/// with respect to each other; this is a convexity precondition, not a
/// general polyhedral union. With `require_matching_materials`, coincident
/// kept faces must carry the same material name before collapsing into
/// one; faces on distinct planes may differ freely.
pub fn merge(inputs: &mut [Brush], require_matching_materials: bool) -> Result<Brush, MergeError> {
    if inputs.is_empty() {
        return Err(MergeError::NoInput);
    }
    for brush in inputs.iter_mut() {
        brush.evaluate_brep();
    }

    let mut kept: Vec<(usize, usize)> = Vec::new();
    for i in 0..inputs.len() {
        for fi in 0..inputs[i].face_count() {
            if !inputs[i].face(fi).contributes() {
                continue;
            }
            let plane = *inputs[i].face(fi).plane();
            let mirrored = (0..inputs.len())
                .filter(|j| *j != i)
                .any(|j| inputs[j].faces().any(|other| *other.plane() == plane.flipped()));
            if mirrored {
                continue;
            }
            let mut skip = false;
            for &(bj, fj) in &kept {
                let face = inputs[i].face(fi);
                let other = inputs[bj].face(fj);
                if *other.plane() == plane {
                    // Coincident outer walls collapse into one face, so
                    // their materials must agree when matching is on.
                    if require_matching_materials
                        && face.material().name != other.material().name
                    {
                        return Err(MergeError::MaterialMismatch);
                    }
                    skip = true;
                    break;
                }
                if Winding::planes_concave(face.winding(), other.winding(), &plane, other.plane())
                {
                    return Err(MergeError::NotConvex);
                }
            }
            if !skip {
                kept.push((i, fi));
            }
        }
    }

    let mut merged = Brush::new();
    merged.set_detail_flag(inputs[0].detail_flag());
    for &(bi, fi) in &kept {
        if merged.add_face(inputs[bi].face(fi).clone()).is_none() {
            return Err(MergeError::TooManyFaces);
        }
    }
    merged.remove_empty_faces();
    debug!(faces = merged.face_count(), "merged brushes");
    Ok(merged)
}

// =============================================================================
// Split by plane
// =============================================================================

/// What became of a brush split by a plane.
#[derive(Debug)]
pub enum SplitOutcome {
    /// The brush lies wholly in front of (or on) the plane: keep it.
    Keep,
    /// The brush lies wholly behind the plane: delete it.
    Discard,
    /// The brush straddled the plane and was split.
    Split {
        /// Fragment in front of the plane, closed by the flipped plane.
        front: Brush,
        /// Fragment behind the plane, closed by the plane as-is.
        back: Brush,
    },
}

/// Splits a brush by an arbitrary plane.
///
/// A straddling brush yields two fragments, each the original plus one new
/// face on the splitting plane, oppositely oriented so both keep outward
/// normals. The new faces carry `projection` and `material`.
pub fn split_by_plane(
    brush: &mut Brush,
    plane: &Plane3,
    projection: &TextureProjection,
    material: &MaterialInfo,
) -> SplitOutcome {
    let counts = brush.classify_plane(plane);
    if !counts.is_straddling() {
        return if counts.back == 0 {
            SplitOutcome::Keep
        } else {
            SplitOutcome::Discard
        };
    }

    let mut front = brush.clone();
    let mut back = brush.clone();
    let front_cap = front.add_face(Face::new(plane.flipped(), *projection, material.clone()));
    let back_cap = back.add_face(Face::new(*plane, *projection, material.clone()));
    if front_cap.is_none() || back_cap.is_none() {
        warn!("split fragments hit the face cap, brush kept whole");
        return SplitOutcome::Keep;
    }
    front.remove_empty_faces();
    back.remove_empty_faces();
    debug!("split brush by plane");
    SplitOutcome::Split { front, back }
}

// =============================================================================
// Tests
// =============================================================================
