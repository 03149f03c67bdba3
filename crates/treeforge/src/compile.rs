//! Resolver entry point that hides configuration wiring.

use tracing::debug;
use treeforge_config::ResolverConfig;
use treeforge_core::{DecisionTree, Result, TreeForgeError, MAX_SWITCH_DEPTH};
use treeforge_jit::CompiledResolver;

/// Compiles `tree` with chunking and cache settings from `treeforge.toml`,
/// falling back to defaults when the file is missing.
///
/// Tree depth and feature count always come from the tree itself.
pub fn compile(tree: &DecisionTree) -> Result<CompiledResolver> {
    let config = ResolverConfig::load("treeforge.toml").unwrap_or_default();
    compile_with(tree, &config)
}

/// Compiles `tree` with `config`, adjusting its depth and feature count to
/// the tree.
///
/// Configured chunking that does not divide the tree depth falls back to the
/// deepest function depth, no deeper than configured, that does. Switch
/// depth drops to one level when the configured one does not divide.
pub fn compile_with(tree: &DecisionTree, config: &ResolverConfig) -> Result<CompiledResolver> {
    #[cfg(feature = "console")]
    treeforge_console::init();

    let depth = tree.depth();
    let feature_count = (config.feature_count as usize).max(tree.required_features());
    let mut config = config
        .clone()
        .with_tree_depth(depth)
        .with_feature_count(feature_count as u32);

    if config.validate().is_err() {
        let (function_depth, switch_depth) =
            fallback_chunking(depth, config.function_depth, config.switch_depth);
        debug!(
            event = "chunking_fallback",
            function_depth,
            switch_depth,
            tree_depth = depth,
        );
        config = config.with_chunking(function_depth, switch_depth);
    }
    config
        .validate()
        .map_err(|e| TreeForgeError::invalid_config(e.to_string()))?;

    CompiledResolver::from_config(tree, &config)
}

fn fallback_chunking(depth: u32, function_depth: u32, switch_depth: u32) -> (u32, u32) {
    let divides = (1..=MAX_SWITCH_DEPTH).contains(&switch_depth) && depth % switch_depth == 0;
    let switch_depth = if divides {
        switch_depth
    } else {
        1
    };
    let function_depth = (switch_depth..=function_depth.clamp(switch_depth, depth))
        .rev()
        .find(|f| depth % f == 0 && f % switch_depth == 0)
        .unwrap_or(depth);
    (function_depth, switch_depth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use treeforge_core::{interpret, DataSetFactory, DecisionTreeFactory};

    #[test]
    fn test_compile_with_adapts_to_tree() {
        let tree = DecisionTreeFactory::with_seed(3).random_tree(6, 5).unwrap();
        let config = ResolverConfig::new().with_chunking(3, 3);
        let resolver = compile_with(&tree, &config).unwrap();

        assert_eq!(resolver.geometry().tree_depth, 6);
        assert_eq!(resolver.function_count(), 9);
        let samples = DataSetFactory::with_seed(4).random_batch(200, resolver.feature_count());
        for features in samples {
            assert_eq!(resolver.run(&tree, &features), interpret(&tree, &features));
        }
    }

    #[test]
    fn test_indivisible_chunking_falls_back() {
        let tree = DecisionTreeFactory::with_seed(5).random_tree(5, 4).unwrap();
        // defaults are F=4 S=2, neither divides 5
        let resolver = compile_with(&tree, &ResolverConfig::default()).unwrap();
        assert_eq!(resolver.geometry().function_depth, 1);
        assert_eq!(resolver.geometry().switch_depth, 1);
        assert_eq!(resolver.function_count(), 31);
    }

    #[test]
    fn test_fallback_chunking() {
        assert_eq!(fallback_chunking(12, 8, 2), (6, 2));
        assert_eq!(fallback_chunking(9, 4, 2), (3, 1));
        assert_eq!(fallback_chunking(8, 4, 0), (4, 1));
        assert_eq!(fallback_chunking(4, 16, 4), (4, 4));
    }

    #[test]
    fn test_cache_dir_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let tree = DecisionTreeFactory::with_seed(6).random_tree(4, 4).unwrap();
        let config = ResolverConfig::new().with_cache_dir(dir.path());

        assert!(!compile_with(&tree, &config).unwrap().report().cache_hit);
        assert!(compile_with(&tree, &config).unwrap().report().cache_hit);
    }
}
