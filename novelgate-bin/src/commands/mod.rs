pub(crate) mod fetch;

pub(crate) use fetch::fetch;

use novelgate_lib::cache::ArtifactCaches;
use novelgate_lib::fetch::Fetcher;

use crate::executor::HttpExecutor;
use crate::options::Config;
use crate::target::Target;

/// Parameters passed to every command
pub(crate) struct CommandParams {
    pub(crate) fetcher: Fetcher<HttpExecutor>,
    pub(crate) caches: ArtifactCaches,
    pub(crate) targets: Vec<Target>,
    pub(crate) cfg: Config,
}
