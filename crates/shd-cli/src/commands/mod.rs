pub mod audit;
pub mod run;
pub mod strategies;
