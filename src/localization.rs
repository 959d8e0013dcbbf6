use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::{FluentArgs, FluentResource, FluentValue};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use tracing::{error, info};
use unic_langid::LanguageIdentifier;

/// Language used when the user's Telegram language is not supported
pub const DEFAULT_LANGUAGE: &str = "ar";

/// Locale sources compiled into the binary
const LOCALE_SOURCES: &[(&str, &str)] = &[
    ("ar", include_str!("../locales/ar/main.ftl")),
    ("en", include_str!("../locales/en/main.ftl")),
];

/// Localization manager for the search bot
pub struct LocalizationManager {
    bundles: HashMap<String, Arc<FluentBundle<FluentResource>>>,
}

impl LocalizationManager {
    /// Create a new localization manager with every embedded locale.
    ///
    /// A locale whose resource fails to parse is logged and skipped.
    pub fn new() -> Self {
        let mut bundles = HashMap::new();

        for (code, source) in LOCALE_SOURCES {
            match Self::create_bundle(code, source) {
                Ok(bundle) => {
                    bundles.insert(code.to_string(), Arc::new(bundle));
                }
                Err(e) => error!(language = %code, error = %e, "Failed to load locale"),
            }
        }

        Self { bundles }
    }

    /// Create a fluent bundle for a specific locale
    fn create_bundle(code: &str, source: &str) -> anyhow::Result<FluentBundle<FluentResource>> {
        let locale: LanguageIdentifier = code.parse()?;
        let mut bundle = FluentBundle::new_concurrent(vec![locale]);
        // Captions are sent as HTML; bidi isolation marks would leak into them
        bundle.set_use_isolating(false);

        let resource = FluentResource::try_new(source.to_string())
            .map_err(|(_, errors)| anyhow::anyhow!("{} parse errors in {code} resource", errors.len()))?;
        bundle
            .add_resource(resource)
            .map_err(|errors| anyhow::anyhow!("{} conflicting messages in {code} resource", errors.len()))?;

        Ok(bundle)
    }

    /// Whether a bundle was loaded for `language`
    pub fn is_language_supported(&self, language: &str) -> bool {
        self.bundles.contains_key(language)
    }

    /// Get a localized message in a specific language, falling back to the default language
    pub fn get_message_in_language(
        &self,
        key: &str,
        language: &str,
        args: Option<&HashMap<&str, &str>>,
    ) -> String {
        let Some(bundle) = self
            .bundles
            .get(language)
            .or_else(|| self.bundles.get(DEFAULT_LANGUAGE))
        else {
            return format!("Missing translation: {}", key);
        };

        let msg = match bundle.get_message(key) {
            Some(msg) => msg,
            None => return format!("Missing translation: {}", key),
        };

        let pattern = match msg.value() {
            Some(pattern) => pattern,
            None => return format!("Missing value for key: {}", key),
        };

        let fluent_args = args.map(|args| {
            let mut fluent_args = FluentArgs::new();
            for (name, value) in args {
                fluent_args.set(*name, FluentValue::from(*value));
            }
            fluent_args
        });

        let mut errors = vec![];
        bundle
            .format_pattern(pattern, fluent_args.as_ref(), &mut errors)
            .into_owned()
    }
}

impl Default for LocalizationManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Global localization instance
static LOCALIZATION_MANAGER: LazyLock<LocalizationManager> = LazyLock::new(LocalizationManager::new);

/// Load the embedded locales eagerly and report what is available
pub fn init_localization() {
    let manager = get_localization_manager();
    let loaded: Vec<&str> = LOCALE_SOURCES
        .iter()
        .map(|(code, _)| *code)
        .filter(|code| manager.is_language_supported(code))
        .collect();
    info!(languages = ?loaded, "Localization initialized");
}

/// Get the global localization manager
pub fn get_localization_manager() -> &'static LocalizationManager {
    &LOCALIZATION_MANAGER
}

/// Map a Telegram language code ("en", "en-US", ...) to a supported language
pub fn detect_language(language_code: Option<&str>) -> &'static str {
    let Some(code) = language_code else {
        return DEFAULT_LANGUAGE;
    };
    let primary = code.split(['-', '_']).next().unwrap_or("").to_ascii_lowercase();

    LOCALE_SOURCES
        .iter()
        .map(|(supported, _)| *supported)
        .find(|supported| *supported == primary && get_localization_manager().is_language_supported(supported))
        .unwrap_or(DEFAULT_LANGUAGE)
}

/// Localized message for the user's language code
pub fn t_lang(key: &str, language_code: Option<&str>) -> String {
    get_localization_manager().get_message_in_language(key, detect_language(language_code), None)
}

/// Localized message with arguments for the user's language code
pub fn t_args_lang(key: &str, args: &[(&str, &str)], language_code: Option<&str>) -> String {
    let args_map: HashMap<&str, &str> = args.iter().cloned().collect();
    get_localization_manager().get_message_in_language(key, detect_language(language_code), Some(&args_map))
}
