use uuid::Uuid;

/// Owning tenant. The nil UUID stands for "no tenant" and is rejected at every
/// entry point.
pub type TenantId = Uuid;

pub type DocumentId = Uuid;

pub type TopicId = Uuid;

pub type SectionId = Uuid;

pub type ChunkId = Uuid;

/// Version number of an ingested document. Re-ingesting the same version
/// replaces its chunk set.
pub type DocumentVersion = i32;

/// True when `tenant_id` carries an actual tenant.
pub fn is_present(tenant_id: &TenantId) -> bool {
    !tenant_id.is_nil()
}
