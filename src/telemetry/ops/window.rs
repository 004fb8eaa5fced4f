use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Window;

#[derive(Copy, Clone, Debug)]
pub enum Phase { LoadInput, LoadTokenizer, Build, WriteOutput }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::LoadInput => "load_input",
        Phase::LoadTokenizer => "load_tokenizer",
        Phase::Build => "build",
        Phase::WriteOutput => "write_output",
    }}
    fn span(&self) -> Span { match self {
        Phase::LoadInput => info_span!("load_input"),
        Phase::LoadTokenizer => info_span!("load_tokenizer"),
        Phase::Build => info_span!("build"),
        Phase::WriteOutput => info_span!("write_output"),
    }}
}

impl OpMarker for Window {
    const NAME: &'static str = "window";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("window") }
}
