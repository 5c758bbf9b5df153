//! Shared configuration for enginekeep binaries.

pub mod settings;
