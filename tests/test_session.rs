//! Background session tests: prompt handling, generation and storage.

mod common;

use std::sync::Arc;

use common::mock_provider::{ScriptedEnhancer, ScriptedFill, ScriptedGenerator};
use common::test_images::{solid, BLUE, GREEN, RED};
use photobooth::config::BoothConfig;
use photobooth::session::BackgroundRecord;
use photobooth::{BackgroundSession, PromptForm};

fn small_config() -> BoothConfig {
    BoothConfig {
        api_key: "sk-test".to_string(),
        image_size: 256,
        target_width: 455,
        ..BoothConfig::default()
    }
}

struct Fixture {
    generator: Arc<ScriptedGenerator>,
    enhancer: Arc<ScriptedEnhancer>,
    filler: Arc<ScriptedFill>,
}

impl Fixture {
    fn new(enhancer: ScriptedEnhancer) -> Self {
        Self {
            generator: Arc::new(ScriptedGenerator::new(RED)),
            enhancer: Arc::new(enhancer),
            filler: Arc::new(ScriptedFill::default()),
        }
    }

    fn session(&self, config: BoothConfig) -> BackgroundSession {
        BackgroundSession::new(
            config,
            self.generator.clone(),
            self.enhancer.clone(),
            self.filler.clone(),
        )
        .unwrap()
    }
}

#[tokio::test]
async fn test_create_enhances_generates_and_extends() {
    let fixture = Fixture::new(ScriptedEnhancer::default());
    let session = fixture.session(small_config());
    let form = PromptForm::guided("Australian outback", "Kangaroo", "Oil painting");

    let background = session.create(&form).await.unwrap();

    assert_eq!(background.prompt, "Kangaroo, Australian outback, style: Oil painting");
    assert_eq!(
        background.enhanced_prompt.as_deref(),
        Some("Vivid: Kangaroo, Australian outback, style: Oil painting")
    );
    assert_eq!((background.image.width(), background.image.height()), (455, 256));
    assert_eq!(background.image.pixel(0, 0), GREEN);
    assert_eq!(background.image.pixel(454, 255), BLUE);

    // The enhanced prompt drives generation and both fills.
    assert_eq!(
        fixture.generator.prompts(),
        vec!["Vivid: Kangaroo, Australian outback, style: Oil painting".to_string()]
    );
    let fills = fixture.filler.requests();
    assert_eq!(fills.len(), 2);
    assert!(fills.iter().all(|r| r.prompt.starts_with("Vivid: ") && r.size == 256));
}

#[tokio::test]
async fn test_create_without_enhancement() {
    let fixture = Fixture::new(ScriptedEnhancer::default());
    let config = BoothConfig {
        enhance_prompt: false,
        ..small_config()
    };
    let session = fixture.session(config);

    let background = session
        .create(&PromptForm::free_form("a castle made of cheese"))
        .await
        .unwrap();
    assert_eq!(background.enhanced_prompt, None);
    assert!(fixture.enhancer.prompts.lock().unwrap().is_empty());
    assert_eq!(fixture.generator.prompts(), vec!["a castle made of cheese".to_string()]);
}

#[tokio::test]
async fn test_enhancement_failure_aborts() {
    let fixture = Fixture::new(ScriptedEnhancer {
        fail: true,
        ..ScriptedEnhancer::default()
    });
    let session = fixture.session(small_config());

    let err = session
        .create(&PromptForm::guided("", "Koala", ""))
        .await
        .unwrap_err();
    assert_eq!(err.category(), "provider");
    assert_eq!(err.context().context.as_deref(), Some("prompt enhancement"));
    assert!(fixture.generator.prompts().is_empty());
    assert_eq!(fixture.filler.calls(), 0);
}

#[tokio::test]
async fn test_incomplete_form_is_rejected() {
    let fixture = Fixture::new(ScriptedEnhancer::default());
    let session = fixture.session(small_config());

    let err = session
        .create(&PromptForm::guided("", "", "Pastel"))
        .await
        .unwrap_err();
    assert_eq!(err.category(), "validation");
    assert!(fixture.enhancer.prompts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_extend_existing() {
    let fixture = Fixture::new(ScriptedEnhancer::default());
    let session = fixture.session(small_config());

    let background = session
        .extend_existing(&solid(256, 256, RED), "Northern Lights")
        .await
        .unwrap();
    assert_eq!(background.image.width(), 455);
    assert_eq!(background.prompt, "Northern Lights");
    assert_eq!(background.enhanced_prompt, None);
    assert!(fixture.generator.prompts().is_empty());
}

#[tokio::test]
async fn test_extend_existing_scales_target_width() {
    let fixture = Fixture::new(ScriptedEnhancer::default());
    let config = BoothConfig {
        image_size: 1024,
        target_width: 1820,
        ..small_config()
    };
    let session = fixture.session(config);
    assert_eq!(session.target_width_for(1024), 1820);
    assert_eq!(session.target_width_for(512), 910);
    assert_eq!(session.target_width_for(256), 455);

    let background = session
        .extend_existing(&solid(256, 256, RED), "Koala")
        .await
        .unwrap();
    assert_eq!(background.image.width(), 455);
}

#[tokio::test]
async fn test_scaled_width_stays_in_range() {
    let fixture = Fixture::new(ScriptedEnhancer::default());

    // Narrowest valid config: 1025 scales to 256 at 256px, one column short.
    let narrow = fixture.session(BoothConfig {
        image_size: 1024,
        target_width: 1025,
        ..small_config()
    });
    assert_eq!(narrow.target_width_for(256), 257);
    assert_eq!(narrow.target_width_for(512), 513);
    let background = narrow
        .extend_existing(&solid(256, 256, RED), "Koala")
        .await
        .unwrap();
    assert_eq!(background.image.width(), 257);

    // Widest valid config: 3070 scales to 767 at 256px, one past the limit.
    let wide = fixture.session(BoothConfig {
        image_size: 1024,
        target_width: 3070,
        ..small_config()
    });
    assert_eq!(wide.target_width_for(256), 766);
    assert_eq!(wide.target_width_for(512), 1534);
    let background = wide
        .extend_existing(&solid(256, 256, RED), "Koala")
        .await
        .unwrap();
    assert_eq!(background.image.width(), 766);
}

#[tokio::test]
async fn test_extend_existing_to_exact_width() {
    let fixture = Fixture::new(ScriptedEnhancer::default());
    let session = fixture.session(BoothConfig {
        image_size: 1024,
        target_width: 1820,
        ..small_config()
    });

    // Used as given, not rescaled from the 1024px config.
    let background = session
        .extend_existing_to(&solid(512, 512, RED), "Koala", Some(910))
        .await
        .unwrap();
    assert_eq!((background.image.width(), background.image.height()), (910, 512));

    let background = session
        .extend_existing_to(&solid(512, 512, RED), "Koala", Some(1200))
        .await
        .unwrap();
    assert_eq!(background.image.width(), 1200);
    assert_eq!(fixture.filler.calls(), 4);
}

#[tokio::test]
async fn test_exact_width_checked_against_input() {
    let fixture = Fixture::new(ScriptedEnhancer::default());
    let session = fixture.session(small_config());

    for width in [512, 1535, 1900] {
        let err = session
            .extend_existing_to(&solid(512, 512, RED), "Koala", Some(width))
            .await
            .unwrap_err();
        assert_eq!(err.category(), "validation", "{}", width);
        assert!(err.to_string().contains("at most 1534"), "{}", err);
    }
    assert_eq!(fixture.filler.calls(), 0);
}

#[tokio::test]
async fn test_extend_existing_rejects_bad_input() {
    let fixture = Fixture::new(ScriptedEnhancer::default());
    let session = fixture.session(small_config());

    let err = session
        .extend_existing(&solid(300, 300, RED), "Koala")
        .await
        .unwrap_err();
    assert_eq!(err.category(), "validation");

    let err = session
        .extend_existing(&solid(256, 200, RED), "Koala")
        .await
        .unwrap_err();
    assert_eq!(err.category(), "invalid_geometry");

    let err = session
        .extend_existing(&solid(256, 256, RED), "  ")
        .await
        .unwrap_err();
    assert_eq!(err.category(), "validation");
    assert_eq!(fixture.filler.calls(), 0);
}

#[test]
fn test_invalid_config_is_rejected() {
    let fixture = Fixture::new(ScriptedEnhancer::default());
    let config = BoothConfig {
        target_width: 256,
        ..small_config()
    };
    let result = BackgroundSession::new(
        config,
        fixture.generator.clone(),
        fixture.enhancer.clone(),
        fixture.filler.clone(),
    );
    assert!(result.is_err());
}

#[tokio::test]
async fn test_write_to_dir() {
    let fixture = Fixture::new(ScriptedEnhancer::default());
    let session = fixture.session(small_config());
    let background = session
        .create(&PromptForm::guided("Cambridge", "", "Pastel"))
        .await
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("nested");
    let png_path = background.write_to_dir(&out).unwrap();

    assert_eq!(png_path, out.join(format!("{}.png", background.id)));
    let saved = photobooth::RasterImage::decode(&std::fs::read(&png_path).unwrap()).unwrap();
    assert_eq!(saved, background.image);

    let json = std::fs::read_to_string(out.join(format!("{}.json", background.id))).unwrap();
    let record: BackgroundRecord = serde_json::from_str(&json).unwrap();
    assert_eq!(record, background.record());
    assert_eq!(record.prompt, "Cambridge, style: Pastel");
    assert_eq!((record.width, record.height), (455, 256));
}
