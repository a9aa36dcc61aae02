// This file is the module declaration file for the `builders` module.
// These modules build the pieces a workflow run is assembled from: the
// pattern list, the prompt text, the output sink and the reporting channel.

// `delivery` module:
// The `Deliver` trait and its `ClipboardSink` and `StdoutSink`
// implementations, which receive the finished prompt.
pub mod delivery;

// `importer` module:
// Loads the ignore list (`.git-commit/ignore` by default) into an ordered
// list of `IgnorePattern`s. A missing file is an empty list, and a read
// error keeps whatever was parsed before it.
pub mod importer;

// `patterns` module:
// The path matcher. Defines `IgnorePattern`, the `PatternKind` rules and
// `select_ignored`, which picks the staged files to leave out.
pub mod patterns;

// `prompt` module:
// Resolves the instructions appended after the diff (named, project or
// built-in prompt) and expands `@context:` directives.
pub mod prompt;

// `reporter` module:
// The injectable `Reporter` used for all user-facing messages, with a
// `tracing`-backed implementation and an in-memory one for tests.
pub mod reporter;
