pub mod mymoney;
