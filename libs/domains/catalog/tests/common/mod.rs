//! Shared fixtures for catalog integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use domain_catalog::models::EMBEDDING_DIMENSION;
use domain_catalog::{
    CatalogConfig, CatalogResult, CatalogService, Embedding, EmbeddingGateway, ImageDescription,
    InMemoryBlobStore, InMemoryCatalogRepository, SearchService,
};
use image::{ImageFormat, Rgb, RgbImage};

/// Deterministic provider: descriptions come from a queue and embeddings are
/// bag-of-words counts hashed into buckets, so texts sharing words are close.
#[derive(Default)]
pub struct FakeGateway {
    descriptions: Mutex<VecDeque<ImageDescription>>,
    embed_calls: AtomicUsize,
    embedded_texts: AtomicUsize,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue(&self, title: &str, category: &str, detailed: &str, colors: &[&str]) {
        self.descriptions
            .lock()
            .unwrap()
            .push_back(description(title, category, detailed, colors));
    }

    pub fn embed_calls(&self) -> usize {
        self.embed_calls.load(Ordering::SeqCst)
    }

    pub fn embedded_texts(&self) -> usize {
        self.embedded_texts.load(Ordering::SeqCst)
    }

    pub fn vector(text: &str) -> Embedding {
        let mut values = vec![0.0f32; EMBEDDING_DIMENSION];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            values[bucket(&word.to_lowercase())] += 1.0;
        }
        Embedding::new(values).unwrap()
    }
}

fn bucket(word: &str) -> usize {
    // FNV-1a
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in word.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x100000001b3);
    }
    (hash % EMBEDDING_DIMENSION as u64) as usize
}

pub fn description(
    title: &str,
    category: &str,
    detailed: &str,
    colors: &[&str],
) -> ImageDescription {
    ImageDescription {
        title: title.to_string(),
        category: category.to_string(),
        detailed_description: detailed.to_string(),
        colors: colors.iter().map(|c| c.to_string()).collect(),
    }
}

#[async_trait]
impl EmbeddingGateway for FakeGateway {
    async fn describe_image(
        &self,
        _image: &[u8],
        _content_type: &str,
    ) -> CatalogResult<ImageDescription> {
        Ok(self
            .descriptions
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| description("Object", "misc", "An object.", &["grey"])))
    }

    async fn embed(&self, texts: &[String]) -> CatalogResult<Vec<Embedding>> {
        self.embed_calls.fetch_add(1, Ordering::SeqCst);
        self.embedded_texts.fetch_add(texts.len(), Ordering::SeqCst);
        Ok(texts.iter().map(|t| FakeGateway::vector(t)).collect())
    }
}

pub fn png(width: u32, height: u32) -> Bytes {
    let img = RgbImage::from_pixel(width, height, Rgb([200, 30, 30]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    Bytes::from(out.into_inner())
}

pub struct Harness {
    pub repository: Arc<InMemoryCatalogRepository>,
    pub blobs: Arc<InMemoryBlobStore>,
    pub gateway: Arc<FakeGateway>,
    pub catalog: CatalogService<InMemoryCatalogRepository>,
    pub search: SearchService<InMemoryCatalogRepository>,
}

pub fn harness() -> Harness {
    let repository = Arc::new(InMemoryCatalogRepository::new());
    let blobs = Arc::new(InMemoryBlobStore::new());
    let gateway = Arc::new(FakeGateway::new());
    let config = CatalogConfig::default();

    let catalog = CatalogService::new(
        repository.clone(),
        blobs.clone(),
        gateway.clone(),
        config.clone(),
    );
    let search = SearchService::new(repository.clone(), gateway.clone(), config);

    Harness {
        repository,
        blobs,
        gateway,
        catalog,
        search,
    }
}
