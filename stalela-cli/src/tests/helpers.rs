//! Temporary databases seeded with a handful of listings.

use camino::{Utf8Path, Utf8PathBuf};
use stalela_store::{Companies, CompanySource, Database, NewCompany};
use tempfile::TempDir;

pub(super) const JOHANNESBURG: (f64, f64) = (-26.2041, 28.0473);

pub(super) struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root =
            Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        Self { _dir: dir, root }
    }

    /// Path of the database the commands are pointed at. Not created here.
    pub(super) fn database(&self) -> Utf8PathBuf {
        self.root.join("data").join("stalela.db")
    }

    pub(super) fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Bootstrap the database and store four listings, one without
    /// coordinates.
    pub(super) fn seed(&self) {
        let db = Database::open(self.database()).expect("open database");
        db.bootstrap().expect("bootstrap schema");
        let companies = Companies::new(&db);
        let (lat, lng) = JOHANNESBURG;
        for listing in [
            NewCompany::new(CompanySource::Yep, "y-1", "Acme Plumbing").at(lat, lng),
            NewCompany::new(CompanySource::Bizcommunity, "b-1", "Bolt Electrical")
                .at(-26.1076, 28.0567),
            NewCompany::new(CompanySource::Yep, "y-2", "Cape Carpentry").at(-33.9249, 18.4241),
            NewCompany::new(CompanySource::Bestdirectory, "d-1", "Unmapped Movers"),
        ] {
            companies.create(&listing).expect("create company");
        }
    }
}
