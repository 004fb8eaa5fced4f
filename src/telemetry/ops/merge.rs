use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Merge;

#[derive(Copy, Clone, Debug)]
pub enum Phase { LoadInput, Group, MergeDoc, WriteOutput }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::LoadInput => "load_input",
        Phase::Group => "group",
        Phase::MergeDoc => "merge_doc",
        Phase::WriteOutput => "write_output",
    }}
    fn span(&self) -> Span { match self {
        Phase::LoadInput => info_span!("load_input"),
        Phase::Group => info_span!("group"),
        Phase::MergeDoc => info_span!("merge_doc"),
        Phase::WriteOutput => info_span!("write_output"),
    }}
}

impl OpMarker for Merge {
    const NAME: &'static str = "merge";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("merge") }
}
