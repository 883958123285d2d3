use crate::error::Result;
use crate::services::{SharedConfig, open_db};
use ingest::{
    FsContentStore, IngestPipeline, IngestResult, PipelineConfig, ReferenceRequest, UploadRequest,
};
use runmap_db::Db;

#[derive(Clone)]
pub struct IngestService {
    config: SharedConfig,
}

impl IngestService {
    pub(super) fn new(config: SharedConfig) -> Self {
        Self { config }
    }

    fn pipeline(&self) -> Result<IngestPipeline<FsContentStore, Db>> {
        let db = open_db(&self.config)?;
        let content = FsContentStore::new(&self.config.content_root);
        let config = PipelineConfig {
            upload_prefix: self.config.upload_prefix.clone(),
        };
        Ok(IngestPipeline::new(config, content, db))
    }

    pub fn by_reference(&self, request: ReferenceRequest) -> Result<IngestResult> {
        let mut pipeline = self.pipeline()?;
        Ok(pipeline.ingest_by_reference(request)?)
    }

    pub fn by_upload(&self, request: UploadRequest) -> Result<IngestResult> {
        let mut pipeline = self.pipeline()?;
        Ok(pipeline.ingest_by_upload(request)?)
    }
}
