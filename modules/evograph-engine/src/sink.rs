use anyhow::Result;

use evograph_common::EvolutionLink;

/// Write-only destination for accepted evolution links. The engine has no
/// opinion on the medium: a file, a message queue, or a graph-database
/// writer all fit behind this trait.
pub trait LinkSink {
    fn accept(&mut self, link: EvolutionLink) -> Result<()>;
}

/// In-memory sink collecting links in batch order.
#[derive(Debug, Default)]
pub struct MemorySink {
    links: Vec<EvolutionLink>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn links(&self) -> &[EvolutionLink] {
        &self.links
    }

    pub fn into_links(self) -> Vec<EvolutionLink> {
        self.links
    }
}

impl LinkSink for MemorySink {
    fn accept(&mut self, link: EvolutionLink) -> Result<()> {
        self.links.push(link);
        Ok(())
    }
}
