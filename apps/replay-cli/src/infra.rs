use replay_domain::repositories::artifacts::{ArtifactReader, ArtifactWriter};
use replay_domain::repositories::statement::StatementSource;
use replay_infrastructure::artifacts::{
    FilesystemArtifactReader, FilesystemArtifactWriter, FilesystemStatementSource,
};

pub struct RunDeps {
    pub statements: Box<dyn StatementSource>,
    pub artifacts: Box<dyn ArtifactWriter>,
}

pub struct SweepDeps {
    pub statements: Box<dyn StatementSource>,
    pub artifacts: FilesystemArtifactWriter,
}

pub struct ReportingDeps {
    pub reader: Box<dyn ArtifactReader>,
    pub writer: Box<dyn ArtifactWriter>,
}

pub fn build_run_deps() -> RunDeps {
    RunDeps {
        statements: Box::new(FilesystemStatementSource::new()),
        artifacts: Box::new(FilesystemArtifactWriter::new()),
    }
}

pub fn build_sweep_deps() -> SweepDeps {
    SweepDeps {
        statements: Box::new(FilesystemStatementSource::new()),
        artifacts: FilesystemArtifactWriter::new(),
    }
}

pub fn build_reporting_deps() -> ReportingDeps {
    ReportingDeps {
        reader: Box::new(FilesystemArtifactReader::new()),
        writer: Box::new(FilesystemArtifactWriter::new()),
    }
}
