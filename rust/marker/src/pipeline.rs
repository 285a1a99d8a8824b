// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Marking run
//!
//! Opens the uploaded content afresh, styles and tags every matching
//! element once, and serialises the result. Progress is reported through a
//! callback at fixed milestones: 0 (loading), 15 (style), 20 (styled item
//! index), 30..80 (elements), 85 (saving), 100 (done).

use crate::error::{MarkError, Result};
use crate::matcher::{find_elements_with, MatchSet, Selection};
use crate::palette::find_colour;
use crate::pset::{add_marker_pset, first_owner_history, marker_properties, MarkerIdentity, PsetChange};
use crate::relations::PropertyRelations;
use crate::style::get_or_create_style;
use crate::styled_items::{apply_colour, StyledItemIndex};
use chrono::NaiveDate;
use ifc_marker_core::IfcModel;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Suffix appended to the uploaded file's stem
pub const OUTPUT_SUFFIX: &str = "_farget";

/// Settings for a marking run
#[derive(Debug, Clone)]
pub struct MarkOptions {
    pub identity: MarkerIdentity,
    /// Written as `MarkeringsDato`
    pub date: NaiveDate,
}

impl MarkOptions {
    /// Options dated today in local time
    pub fn today(identity: MarkerIdentity) -> Self {
        Self {
            identity,
            date: chrono::Local::now().date_naive(),
        }
    }
}

impl Default for MarkOptions {
    fn default() -> Self {
        Self::today(MarkerIdentity::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStage {
    Loading,
    CreatingStyle,
    IndexingStyles,
    Colouring,
    Saving,
    Done,
}

/// Progress update sent during a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Progress {
    pub percent: u8,
    pub stage: ProgressStage,
    pub processed: usize,
    pub total: usize,
    pub message: String,
}

impl Progress {
    fn new(percent: u8, stage: ProgressStage, processed: usize, total: usize, message: String) -> Self {
        Self {
            percent,
            stage,
            processed,
            total,
            message,
        }
    }
}

/// Result row for one element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementReport {
    pub global_id: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub name: String,
    pub property: String,
    pub coloured: bool,
}

impl ElementReport {
    /// `OK` or `Feilet`, as shown in the result table
    pub fn status(&self) -> &'static str {
        if self.coloured {
            "OK"
        } else {
            "Feilet"
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarkReport {
    pub colour: String,
    pub filter: String,
    pub total: usize,
    pub coloured: usize,
    pub style_created: bool,
    pub psets_created: usize,
    pub psets_updated: usize,
    pub elements: Vec<ElementReport>,
}

impl MarkReport {
    pub fn failed(&self) -> usize {
        self.total - self.coloured
    }
}

/// Report and STEP text of a finished run
#[derive(Debug, Clone)]
pub struct MarkOutcome {
    pub report: MarkReport,
    pub output: String,
}

/// `<stem>_farget.ifc`
pub fn output_file_name(upload_name: &str) -> String {
    let stem = Path::new(upload_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("model");
    format!("{}{}.ifc", stem, OUTPUT_SUFFIX)
}

/// Scan `content` for the selection and mark every match
pub fn mark(
    content: &str,
    selection: &Selection,
    colour: &str,
    options: &MarkOptions,
    progress: impl FnMut(&Progress),
) -> Result<MarkOutcome> {
    let mut model = IfcModel::open(content)?;
    let relations = PropertyRelations::build(&mut model);
    let matches = find_elements_with(&mut model, &relations, selection)?;
    mark_elements(content, &matches, colour, options, progress)
}

/// Mark the elements of a previous match scan over the same `content`
pub fn mark_elements(
    content: &str,
    matches: &MatchSet,
    colour: &str,
    options: &MarkOptions,
    mut progress: impl FnMut(&Progress),
) -> Result<MarkOutcome> {
    let colour = find_colour(colour)?;
    let filter = matches.selection.filter_info();
    let unique = matches.unique();
    let total = unique.len();
    if total == 0 {
        return Err(MarkError::NoMatches(filter));
    }

    tracing::info!(colour = colour.name, filter = %filter, elements = total, "Starting marking run");
    progress(&Progress::new(0, ProgressStage::Loading, 0, total, "Laster IFC-fil...".into()));

    let mut model = IfcModel::open(content)?;
    progress(&Progress::new(15, ProgressStage::CreatingStyle, 0, total, "Oppretter fargestil...".into()));

    let style = get_or_create_style(&mut model, colour)?;
    progress(&Progress::new(
        20,
        ProgressStage::IndexingStyles,
        0,
        total,
        "Indekserer eksisterende stiler...".into(),
    ));

    let mut styled_index = StyledItemIndex::build(&mut model)?;
    let mut relations = PropertyRelations::build(&mut model);
    let owner_history = first_owner_history(&model);
    let properties = marker_properties(colour.name, &matches.selection, options.date, &options.identity);
    progress(&Progress::new(
        30,
        ProgressStage::Colouring,
        0,
        total,
        format!("Fargelegger {} elementer...", total),
    ));

    let mut report = MarkReport {
        colour: colour.name.to_string(),
        filter,
        style_created: style.created,
        ..MarkReport::default()
    };

    for (i, hit) in unique.into_iter().enumerate() {
        let coloured = match apply_colour(&mut model, hit.element_id, &style, &mut styled_index) {
            Ok(coloured) => coloured,
            Err(e) => {
                tracing::warn!(element = hit.element_id, error = %e, "Failed to colour element");
                false
            }
        };
        match add_marker_pset(&mut model, &mut relations, hit.element_id, &properties, owner_history)? {
            PsetChange::Created { .. } => report.psets_created += 1,
            PsetChange::Updated { .. } => report.psets_updated += 1,
        }

        if coloured {
            report.coloured += 1;
        }
        report.total += 1;
        report.elements.push(ElementReport {
            global_id: hit.global_id.clone(),
            type_name: hit.type_name.clone(),
            name: hit.display_name().to_string(),
            property: hit.property.clone(),
            coloured,
        });

        let processed = i + 1;
        let percent = 30 + (processed * 50 / total) as u8;
        progress(&Progress::new(
            percent,
            ProgressStage::Colouring,
            processed,
            total,
            format!("Fargelegger... {}/{}", processed, total),
        ));
    }

    progress(&Progress::new(85, ProgressStage::Saving, total, total, "Lagrer IFC-fil...".into()));
    let output = model.to_step_string();

    tracing::info!(
        total = report.total,
        coloured = report.coloured,
        added = model.added_count(),
        edited = model.edited_count(),
        "Marking run finished"
    );
    progress(&Progress::new(100, ProgressStage::Done, total, total, "Ferdig!".into()));

    Ok(MarkOutcome { report, output })
}
