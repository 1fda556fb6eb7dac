mod fixed;
mod int;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Represents wrapping addition of superpositional integers
pub struct HomomorphicAddition;
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Represents wrapping subtraction of superpositional integers
pub struct HomomorphicSubtraction;
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Represents wrapping multiplication of superpositional integers
pub struct HomomorphicMultiplication;
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Represents truncating division of superpositional integers
pub struct HomomorphicDivision;
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Represents the remainder of truncating division, with the sign of the dividend
pub struct HomomorphicRemainder;
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Represents two's complement negation
pub struct HomomorphicNegation;
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Represents absolute value
pub struct HomomorphicAbsolute;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Represents multiplication of fixed point values with `F` fraction bits
pub struct HomomorphicFixedMultiplication<const F: usize>;
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Represents division of fixed point values with `F` fraction bits
pub struct HomomorphicFixedDivision<const F: usize>;
